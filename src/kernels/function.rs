use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr};
use num_enum::{TryFromPrimitive, IntoPrimitive};

use super::geometric;
use super::FunctionKernel;

/**
  Builtin functions reachable through `call`. The discriminant is the function id word that
  follows a `call` instruction word. The transform family resolves its overloads from the
  types of the leading arguments at run time.
*/
#[derive(
StrumDisplay, IntoStaticStr, EnumString, TryFromPrimitive, IntoPrimitive,
Clone,        Copy,          Eq, PartialEq,  Debug,            Hash
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Function {
  Xcomp,
  Ycomp,
  Zcomp,
  Setxcomp,
  Setycomp,
  Setzcomp,
  Length,
  Normalize,
  Distance,
  Area,
  Faceforward,
  Reflect,
  Refract,
  Fresnel,
  Rotate,
  Transform,
  Vtransform,
  Ntransform,
  Depth,
  Calculatenormal,
  Du,
  Dv,
}

impl Function {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  pub fn kernel(&self) -> FunctionKernel {
    match self {
      Function::Xcomp           => geometric::xcomp,
      Function::Ycomp           => geometric::ycomp,
      Function::Zcomp           => geometric::zcomp,
      Function::Setxcomp        => geometric::setxcomp,
      Function::Setycomp        => geometric::setycomp,
      Function::Setzcomp        => geometric::setzcomp,
      Function::Length          => geometric::length,
      Function::Normalize       => geometric::normalize,
      Function::Distance        => geometric::distance,
      Function::Area            => geometric::area,
      Function::Faceforward     => geometric::faceforward,
      Function::Reflect         => geometric::reflect,
      Function::Refract         => geometric::refract,
      Function::Fresnel         => geometric::fresnel,
      Function::Rotate          => geometric::rotate,
      Function::Transform       => geometric::transform,
      Function::Vtransform      => geometric::vtransform,
      Function::Ntransform      => geometric::ntransform,
      Function::Depth           => geometric::depth,
      Function::Calculatenormal => geometric::calculatenormal,
      Function::Du              => geometric::du,
      Function::Dv              => geometric::dv,
    }
  }

  /// The fewest and most arguments the function accepts.
  pub fn arity(&self) -> (usize, usize) {
    match self {
      | Function::Xcomp
      | Function::Ycomp
      | Function::Zcomp
      | Function::Length
      | Function::Normalize
      | Function::Area
      | Function::Depth
      | Function::Calculatenormal
      | Function::Du
      | Function::Dv => (1, 1),

      | Function::Setxcomp
      | Function::Setycomp
      | Function::Setzcomp
      | Function::Distance
      | Function::Reflect => (2, 2),

      Function::Faceforward => (2, 3),
      Function::Refract     => (3, 3),
      Function::Rotate      => (4, 4),
      Function::Fresnel     => (5, 5),

      | Function::Transform
      | Function::Vtransform
      | Function::Ntransform => (2, 3),
    }
  }

  /// True for functions that only write their arguments and leave the result alone.
  pub fn is_void(&self) -> bool {
    matches!(
      self,
      Function::Setxcomp | Function::Setycomp | Function::Setzcomp | Function::Fresnel
    )
  }
}
