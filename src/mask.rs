/*!
  The masking stack tracks which shading points are active inside nested conditionals. The
  base entry marks every point active. Entering a conditional pushes the predicate anded with
  the enclosing entry, the `else` branch replaces the top with its complement (still anded with
  the enclosing entry), and leaving the conditional pops back to the enclosing entry unchanged.

  Only varying predicates can split the grid; a uniform predicate switches every point of the
  enclosing entry on or off together.
*/

use crate::value::Value;

#[derive(Clone, Debug, Default)]
pub struct MaskStack {
  points  : usize,
  entries : Vec<Vec<bool>>,
  /// Popped entries kept for reuse so that conditionals in a loop do not allocate.
  spare   : Vec<Vec<bool>>,
}

impl MaskStack {

  pub fn new(points: usize) -> MaskStack {
    MaskStack {
      points,
      entries: vec![vec![true; points]],
      spare: Vec::new(),
    }
  }

  /// Returns the stack to its base entry over `points` points.
  pub fn reset(&mut self, points: usize) {
    while self.entries.len() > 1 {
      if let Some(entry) = self.entries.pop() {
        self.spare.push(entry);
      }
    }
    self.points = points;
    match self.entries.first_mut() {
      Some(base) => {
        base.clear();
        base.resize(points, true);
      }
      None => self.entries.push(vec![true; points]),
    }
  }

  pub fn points(&self) -> usize {
    self.points
  }

  /// Number of entries, including the base entry.
  pub fn depth(&self) -> usize {
    self.entries.len()
  }

  fn top(&self) -> &[bool] {
    match self.entries.last() {
      Some(entry) => entry,
      None        => unreachable!("Error: The mask stack has no base entry."),
    }
  }

  fn allocate(&mut self) -> Vec<bool> {
    let mut entry = self.spare.pop().unwrap_or_default();
    entry.clear();
    entry.resize(self.points, false);
    entry
  }

  /// Pushes `predicate != 0 && top` for each point. `predicate` must be a float value.
  pub fn generate(&mut self, predicate: &Value) {
    assert_eq!(
      predicate.components(), 1,
      "Error: A {} value was used as a mask predicate.", predicate.ty()
    );
    assert!(
      predicate.is_uniform() || predicate.size() == self.points,
      "Error: A predicate of {} elements was given to a mask over {} points.",
      predicate.size(), self.points
    );

    let mut entry = self.allocate();
    {
      let top = self.top();
      for (i, active) in entry.iter_mut().enumerate() {
        *active = top[i] && predicate.float(i) != 0.0;
      }
    }
    self.entries.push(entry);
  }

  /// Replaces the top entry with its complement restricted to the enclosing entry.
  pub fn invert(&mut self) {
    let depth = self.entries.len();
    assert!(depth >= 2, "Error: Tried to invert the base mask.");

    let (enclosing, top) = self.entries.split_at_mut(depth - 1);
    let enclosing = &enclosing[depth - 2];
    for (active, outer) in top[0].iter_mut().zip(enclosing.iter()) {
      *active = !*active && *outer;
    }
  }

  /// Pops the top entry, restoring the enclosing one.
  pub fn clear(&mut self) {
    assert!(self.entries.len() > 1, "Error: Tried to clear the base mask.");
    if let Some(entry) = self.entries.pop() {
      self.spare.push(entry);
    }
  }

  /// True when no point of the top entry is active.
  pub fn is_empty(&self) -> bool {
    !self.top().iter().any(|active| *active)
  }

  pub fn active_points(&self) -> usize {
    self.top().iter().filter(|active| **active).count()
  }

  /// The top entry, or `None` outside any conditional, where every point is written.
  pub fn active(&self) -> Option<&[bool]> {
    match self.entries.len() {
      1 => None,
      _ => Some(self.top()),
    }
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn base_entry_is_unconditional() {
    let masks = MaskStack::new(3);
    assert_eq!(masks.depth(), 1);
    assert!(masks.active().is_none());
    assert!(!masks.is_empty());
    assert_eq!(masks.active_points(), 3);
  }

  #[test]
  fn nested_masks_compose_and_restore() {
    let mut masks = MaskStack::new(4);
    masks.generate(&Value::varying_float(&[1.0, 1.0, 0.0, 0.0]));
    let outer = masks.active().unwrap().to_vec();

    masks.generate(&Value::varying_float(&[1.0, 0.0, 1.0, 0.0]));
    assert_eq!(masks.active().unwrap(), &[true, false, false, false]);

    masks.clear();
    assert_eq!(masks.active().unwrap(), outer.as_slice());
    masks.clear();
    assert!(masks.active().is_none());
  }

  #[test]
  fn branches_partition_the_enclosing_mask() {
    let mut masks = MaskStack::new(4);
    masks.generate(&Value::varying_float(&[1.0, 1.0, 1.0, 0.0]));
    let enclosing = masks.active().unwrap().to_vec();

    masks.generate(&Value::varying_float(&[1.0, 0.0, 1.0, 1.0]));
    let then_branch = masks.active().unwrap().to_vec();
    masks.invert();
    let else_branch = masks.active().unwrap().to_vec();

    for i in 0..4 {
      assert!(!(then_branch[i] && else_branch[i]));
      assert_eq!(then_branch[i] || else_branch[i], enclosing[i]);
    }
  }

  #[test]
  fn uniform_predicates_switch_every_point() {
    let mut masks = MaskStack::new(3);
    masks.generate(&Value::uniform_float(0.0));
    assert!(masks.is_empty());
    masks.invert();
    assert_eq!(masks.active_points(), 3);
  }

  #[test]
  fn reset_returns_to_the_base_entry() {
    let mut masks = MaskStack::new(2);
    masks.generate(&Value::uniform_float(0.0));
    masks.reset(5);
    assert_eq!(masks.depth(), 1);
    assert_eq!(masks.points(), 5);
    assert_eq!(masks.active_points(), 5);
  }

  #[test]
  #[should_panic(expected = "clear the base mask")]
  fn clearing_the_base_entry_panics() {
    MaskStack::new(1).clear();
  }

  #[test]
  #[should_panic(expected = "invert the base mask")]
  fn inverting_the_base_entry_panics() {
    MaskStack::new(1).invert();
  }
}
