// Copyright (c) 2017-2021 Fabian Schuiki

//! Signal values
//!
//! This module implements the values a traced signal can carry, together with
//! their rendering in the VCD value change syntax.

use num::{BigUint, One, Zero};
use std::fmt::{self, Display};

/// A value carried by a signal.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An unsigned integer, interpreted as a bit vector if the signal has a
    /// width, or as a plain number otherwise.
    Int(BigUint),
    /// A symbolic value of an enumerated type.
    Enum(String),
    /// A real number.
    Real(f64),
}

impl Value {
    /// Create an integer value from a `u64`.
    pub fn from_u64(value: u64) -> Value {
        Value::Int(value.into())
    }

    /// Create an enumerated value.
    pub fn symbol(name: impl Into<String>) -> Value {
        Value::Enum(name.into())
    }

    /// Check whether the value can only be traced as a VCD `real`.
    ///
    /// Enumerated values are emitted as strings, which viewers only accept on
    /// `real` variables.
    pub fn is_scalar_kind(&self) -> bool {
        match self {
            Value::Int(..) => false,
            Value::Enum(..) | Value::Real(..) => true,
        }
    }

    /// If this value is an integer, access it.
    pub fn get_int(&self) -> Option<&BigUint> {
        match self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Render this value as a VCD value change for the variable `code`.
    ///
    /// `width` is the declared bit width of the signal carrying the value.
    pub fn vcd_change(&self, width: usize, code: &str) -> String {
        match self {
            Value::Enum(name) => format!("s{} {}", name, code),
            Value::Real(v) => format!("r{} {}", v, code),
            Value::Int(v) if width == 0 => format!("r{} {}", v, code),
            Value::Int(v) if width == 1 => {
                let bit = if (v & BigUint::one()).is_zero() { 0 } else { 1 };
                format!("{}{}", bit, code)
            }
            Value::Int(v) => {
                let mask = (BigUint::one() << width) - BigUint::one();
                format!("b{:0width$b} {}", v & mask, code, width = width)
            }
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Enum(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
        }
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Value {
        Value::from_u64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::from_u64(v as u64)
    }
}

impl From<BigUint> for Value {
    fn from(v: BigUint) -> Value {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Real(v)
    }
}
