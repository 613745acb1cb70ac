/*!
  Geometric builtins called through `call`. Each kernel resets its result to the type and
  storage the builtin produces: varying if any operand is varying, in which case uniform
  operands are broadcast. Kernels that write their arguments in place (`setxcomp` and friends,
  `fresnel`'s outputs) honour the active mask; results are fresh values and are written at every
  point, leaving it to a later masked `assign` to decide which points keep them.
*/

use glam::{Mat4, Vec3};

use super::CallContext;
use crate::types::{Storage, ValueType};
use crate::value::Value;

// region Helpers

fn widest(values: &[&Value]) -> Storage {
  values.iter().fold(Storage::Uniform, |storage, value| storage.widest(value.storage()))
}

fn require_triple(value: &Value, name: &str) {
  assert!(
    value.ty().is_triple(),
    "Error: {} requires a point, vector, normal, or color but was given a {}.", name, value.ty()
  );
}

fn require_uniform(value: &Value, name: &str) {
  assert!(
    value.is_uniform(),
    "Error: {} requires a uniform {} but was given a varying one.", name, value.ty()
  );
}

fn map_float<F>(context: &CallContext, result: &mut Value, storage: Storage, f: F)
  where F: Fn(usize) -> f32
{
  result.reset(ValueType::Float, storage, storage.size(context.points));
  for i in 0..result.size() {
    result.set_float(i, f(i));
  }
}

fn map_vec3<F>(context: &CallContext, result: &mut Value, ty: ValueType, storage: Storage, f: F)
  where F: Fn(usize) -> Vec3
{
  result.reset(ty, storage, storage.size(context.points));
  for i in 0..result.size() {
    result.set_vec3(i, f(i));
  }
}

// endregion

// region Components

fn component(context: &CallContext, result: &mut Value, arguments: &mut [Value], axis: usize) {
  let p = &arguments[0];
  require_triple(p, "a component accessor");
  map_float(context, result, p.storage(), |i| p.vec3(i)[axis]);
}

pub(crate) fn xcomp(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  component(context, result, arguments, 0);
}

pub(crate) fn ycomp(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  component(context, result, arguments, 1);
}

pub(crate) fn zcomp(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  component(context, result, arguments, 2);
}

/// Writes one component of the first argument in place at the active points.
fn set_component(context: &CallContext, arguments: &mut [Value], axis: usize) {
  let (p, rest) = arguments.split_at_mut(1);
  let (p, x) = (&mut p[0], &rest[0]);
  require_triple(p, "a component setter");
  assert!(
    p.is_varying() || x.is_uniform(),
    "Error: A varying component was written into a uniform {}.", p.ty()
  );

  for i in 0..p.size() {
    if p.is_varying() && !context.is_active(i) {
      continue;
    }
    let mut v = p.vec3(i);
    v[axis] = x.float(i);
    p.set_vec3(i, v);
  }
}

pub(crate) fn setxcomp(context: &CallContext, _result: &mut Value, arguments: &mut [Value]) {
  set_component(context, arguments, 0);
}

pub(crate) fn setycomp(context: &CallContext, _result: &mut Value, arguments: &mut [Value]) {
  set_component(context, arguments, 1);
}

pub(crate) fn setzcomp(context: &CallContext, _result: &mut Value, arguments: &mut [Value]) {
  set_component(context, arguments, 2);
}

// endregion

// region Lengths and directions

pub(crate) fn length(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let x = &arguments[0];
  require_triple(x, "length");
  map_float(context, result, x.storage(), |i| x.vec3(i).length());
}

/// A zero vector normalizes to itself.
pub(crate) fn normalize(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let n = &arguments[0];
  require_triple(n, "normalize");
  map_vec3(context, result, n.ty(), n.storage(), |i| {
    let v = n.vec3(i);
    match v.length() > 0.0 {
      true  => v / v.length(),
      false => v,
    }
  });
}

pub(crate) fn distance(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let (p0, p1) = (&arguments[0], &arguments[1]);
  require_triple(p0, "distance");
  require_triple(p1, "distance");
  map_float(context, result, widest(&[p0, p1]), |i| (p1.vec3(i) - p0.vec3(i)).length());
}

/// `faceforward(N, I)` or `faceforward(N, I, Nref)`: `N` flipped to face against `I`. The two
/// argument form uses `N` itself as the reference.
pub(crate) fn faceforward(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let n = &arguments[0];
  let incident = &arguments[1];
  let reference = arguments.get(2).unwrap_or(n);
  require_triple(n, "faceforward");
  require_triple(incident, "faceforward");
  require_triple(reference, "faceforward");

  let storage = widest(&[n, incident, reference]);
  map_vec3(context, result, n.ty(), storage, |i| {
    match (-incident.vec3(i)).dot(reference.vec3(i)) < 0.0 {
      true  => -n.vec3(i),
      false => n.vec3(i),
    }
  });
}

pub(crate) fn reflect(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let (incident, n) = (&arguments[0], &arguments[1]);
  require_triple(incident, "reflect");
  require_triple(n, "reflect");
  map_vec3(context, result, ValueType::Vector, widest(&[incident, n]), |i| {
    let (v, n) = (incident.vec3(i), n.vec3(i));
    v - 2.0 * v.dot(n) * n
  });
}

/// `refract(I, N, eta)`. At or past the critical angle there is no transmitted ray and the
/// result is the zero vector.
pub(crate) fn refract(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let (incident, n, eta) = (&arguments[0], &arguments[1], &arguments[2]);
  require_triple(incident, "refract");
  require_triple(n, "refract");

  map_vec3(context, result, ValueType::Vector, widest(&[incident, n, eta]), |i| {
    refracted(incident.vec3(i), n.vec3(i), eta.float(i))
  });
}

pub(crate) fn refracted(incident: Vec3, n: Vec3, eta: f32) -> Vec3 {
  let idotn = incident.dot(n);
  let k = 1.0 - eta * eta * (1.0 - idotn * idotn);
  match k > 0.0 {
    true  => eta * incident - (eta * idotn + k.sqrt()) * n,
    false => Vec3::ZERO,
  }
}

/// The reflection and transmission coefficients for unpolarized light at relative index
/// `eta`. An `eta` below one is treated as total reflection.
pub(crate) fn fresnel_coefficients(incident: Vec3, normal: Vec3, eta: f32) -> (f32, f32) {
  if eta < 1.0 {
    return (1.0, 0.0);
  }
  let c = match incident.length() > 0.0 && normal.length() > 0.0 {
    true  => incident.normalize().dot(normal.normalize()).abs(),
    false => 0.0,
  };
  let g = (eta * eta + c * c - 1.0).max(0.0).sqrt();
  let m = g - c;
  let n = g + c;
  if n.abs() < f32::EPSILON {
    return (1.0, 0.0);
  }
  let o = c * n - 1.0;
  let p = c * m + 1.0;
  let kr = (0.5 * (m * m) / (n * n) * (1.0 + (o * o) / (p * p))).min(1.0);
  (kr, 1.0 - kr)
}

/// `fresnel(I, N, eta, Kr, Kt)`. Writes `Kr` and `Kt` in place at the active points.
pub(crate) fn fresnel(context: &CallContext, _result: &mut Value, arguments: &mut [Value]) {
  let (inputs, outputs) = arguments.split_at_mut(3);
  let (incident, n, eta) = (&inputs[0], &inputs[1], &inputs[2]);
  require_triple(incident, "fresnel");
  require_triple(n, "fresnel");

  let (kr, kt) = outputs.split_at_mut(1);
  let (kr, kt) = (&mut kr[0], &mut kt[0]);
  kr.ensure(ValueType::Float, Storage::Varying, context.points);
  kt.ensure(ValueType::Float, Storage::Varying, context.points);

  for i in (0..context.points).filter(|i| context.is_active(*i)) {
    let (reflected, transmitted) = fresnel_coefficients(incident.vec3(i), n.vec3(i), eta.float(i));
    kr.set_float(i, reflected);
    kt.set_float(i, transmitted);
  }
}

/// `rotate(Q, angle, P0, P1)`: `Q` rotated by `angle` radians about the direction from `P0` to
/// `P1`. The rotation is applied as to a direction, so the axis passes through the origin.
pub(crate) fn rotate(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let (q, angle, p0, p1) = (&arguments[0], &arguments[1], &arguments[2], &arguments[3]);
  require_triple(q, "rotate");
  require_uniform(angle, "rotate");
  require_uniform(p0, "rotate");
  require_uniform(p1, "rotate");

  let axis = (p1.vec3(0) - p0.vec3(0)).normalize_or_zero();
  let rotation = Mat4::from_axis_angle(axis, angle.float(0));
  map_vec3(context, result, q.ty(), q.storage(), |i| rotation.transform_vector3(q.vec3(i)));
}

// endregion

// region Transforms

/// The matrix described by the leading arguments of a `transform` family call.
fn leading_matrix(context: &CallContext, leading: &[Value]) -> Mat4 {
  for value in leading {
    require_uniform(value, "transform");
  }
  match leading {
    [space] if space.ty() == ValueType::String => context.renderer.transform_to(space.string()),
    [matrix] if matrix.ty() == ValueType::Matrix => matrix.matrix(0),
    [from, to] if from.ty() == ValueType::String && to.ty() == ValueType::String => {
      context.renderer.transform_between(from.string(), to.string())
    }
    [from, matrix] if from.ty() == ValueType::String && matrix.ty() == ValueType::Matrix => {
      matrix.matrix(0) * context.renderer.transform_from(from.string())
    }
    _ => unreachable!(
      "Error: A transform was called with {} leading arguments that are not a space or matrix.",
      leading.len()
    ),
  }
}

#[derive(Copy, Clone)]
enum TransformAs {
  Point,
  Vector,
  Normal,
}

fn transform_as(
  context   : &CallContext,
  result    : &mut Value,
  arguments : &mut [Value],
  kind      : TransformAs
) {
  let (leading, p) = arguments.split_at(arguments.len() - 1);
  let p = &p[0];
  require_triple(p, "transform");

  let matrix = leading_matrix(context, leading);
  let matrix = match kind {
    TransformAs::Normal => matrix.inverse().transpose(),
    _                   => matrix,
  };
  map_vec3(context, result, p.ty(), p.storage(), |i| match kind {
    TransformAs::Point => matrix.transform_point3(p.vec3(i)),
    _                  => matrix.transform_vector3(p.vec3(i)),
  });
}

pub(crate) fn transform(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  transform_as(context, result, arguments, TransformAs::Point);
}

pub(crate) fn vtransform(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  transform_as(context, result, arguments, TransformAs::Vector);
}

pub(crate) fn ntransform(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  transform_as(context, result, arguments, TransformAs::Normal);
}

/// Raster space depth of a point.
pub(crate) fn depth(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let p = &arguments[0];
  require_triple(p, "depth");
  map_float(context, result, p.storage(), |i| context.renderer.raster(p.vec3(i)).z);
}

// endregion

// region Grid derivatives

/// The neighbour of point `i` one step along the grid, or `None` at the far edge.
fn forward(context: &CallContext, i: usize, along_u: bool) -> Option<(usize, usize)> {
  let (x, y) = (i % context.width, i / context.width);
  match along_u {
    true if context.width > 1 => {
      let x = x.min(context.width - 2);
      Some((y * context.width + x, y * context.width + x + 1))
    }
    false if context.height > 1 => {
      let y = y.min(context.height - 2);
      Some((y * context.width + x, (y + 1) * context.width + x))
    }
    _ => None,
  }
}

/**
  Forward differences across the grid. The last column (for `du`) or row (for `dv`) repeats
  the one before it; a grid one point wide in that direction, or a uniform operand, has no
  variation and differentiates to zero.
*/
fn derivative(context: &CallContext, result: &mut Value, value: &Value, along_u: bool) {
  let name = if along_u { "du" } else { "dv" };
  assert!(
    value.ty() == ValueType::Float || value.ty().is_triple(),
    "Error: {} requires a float or a triple but was given a {}.", name, value.ty()
  );
  result.reset(value.ty(), value.storage(), value.size());
  if value.is_uniform() {
    return;
  }
  assert_eq!(
    value.size(), context.width * context.height,
    "Error: {} was given {} elements on a {}x{} grid.", name, value.size(), context.width, context.height
  );

  for i in 0..value.size() {
    let (a, b) = match forward(context, i, along_u) {
      Some(pair) => pair,
      None       => continue,
    };
    match value.ty() {
      ValueType::Float => result.set_float(i, value.float(b) - value.float(a)),
      _                => result.set_vec3(i, value.vec3(b) - value.vec3(a)),
    }
  }
}

pub(crate) fn du(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  derivative(context, result, &arguments[0], true);
}

pub(crate) fn dv(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  derivative(context, result, &arguments[0], false);
}

/// The geometric normal from the cross product of the surface derivatives, ordered to suit the
/// handedness of the geometry.
pub(crate) fn calculatenormal(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let p = &arguments[0];
  require_triple(p, "calculatenormal");

  let mut dpdu = Value::empty();
  let mut dpdv = Value::empty();
  derivative(context, &mut dpdu, p, true);
  derivative(context, &mut dpdv, p, false);

  let left_handed = context.renderer.geometry_left_handed();
  map_vec3(context, result, ValueType::Normal, p.storage(), |i| match left_handed {
    true  => dpdu.vec3(i).cross(dpdv.vec3(i)),
    false => dpdv.vec3(i).cross(dpdu.vec3(i)),
  });
}

/**
  The area of the micropolygon at each point: the lengths of its two edges along the grid
  multiplied. The last column and row repeat their neighbours; a grid without both a second
  row and a second column has no micropolygons and gives zero.
*/
pub(crate) fn area(context: &CallContext, result: &mut Value, arguments: &mut [Value]) {
  let p = &arguments[0];
  require_triple(p, "area");
  result.reset(ValueType::Float, p.storage(), p.size());
  if p.is_uniform() || context.width < 2 || context.height < 2 {
    return;
  }
  for i in 0..p.size() {
    if let (Some((a, b)), Some((c, d))) = (forward(context, i, true), forward(context, i, false)) {
      let u = (p.vec3(b) - p.vec3(a)).length();
      let v = (p.vec3(d) - p.vec3(c)).length();
      result.set_float(i, u * v);
    }
  }
}

// endregion
