//! pool configuration
//!
//! immutable after the pool is constructed. usually read from a toml file:
//!
//! ```toml
//! value_unit = 1000000000000
//! verification_key = "0a0b0c"
//! curve = "bn254"
//! tree_depth = 32
//! # token = "0x6b175474e89094c44da98b954eedeac495271d0f"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::field::{Bls12_377, Bn254, FieldLayout};
use crate::verifier::VerificationKey;
use crate::{Address, Error, Result, DEFAULT_TREE_DEPTH, JS_IN, JS_OUT, NUM_INPUTS, PUBLIC_VALUE_BITS};

/// deepest supported commitment tree
pub const MAX_TREE_DEPTH: u32 = 32;

/// scalar field the proof system works over
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[allow(non_camel_case_types)]
pub enum Curve {
    #[default]
    Bn254,
    #[serde(rename = "bls12-377")]
    Bls12_377,
}

impl Curve {
    /// residual-bit strategy for this field
    pub fn layout(&self) -> Box<dyn FieldLayout + Send + Sync> {
        match self {
            Curve::Bn254 => Box::new(Bn254),
            Curve::Bls12_377 => Box::new(Bls12_377),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
    /// spent notes per mix
    #[serde(default = "default_js_in")]
    pub js_in: usize,
    /// new notes per mix
    #[serde(default = "default_js_out")]
    pub js_out: usize,
    #[serde(default = "default_public_value_bits")]
    pub public_value_bits: u32,
    /// external amount represented by one unit of packed public value
    pub value_unit: u64,
    /// fungible token binding, `None` for the native currency
    #[serde(default)]
    pub token: Option<Address>,
    pub verification_key: VerificationKey,
    #[serde(default = "default_tree_depth")]
    pub tree_depth: u32,
    #[serde(default)]
    pub curve: Curve,
}

fn default_js_in() -> usize {
    JS_IN
}

fn default_js_out() -> usize {
    JS_OUT
}

fn default_public_value_bits() -> u32 {
    PUBLIC_VALUE_BITS
}

fn default_tree_depth() -> u32 {
    DEFAULT_TREE_DEPTH
}

impl PoolConfig {
    /// native-currency pool with default layout
    pub fn native(verification_key: VerificationKey, value_unit: u64) -> Self {
        Self {
            js_in: JS_IN,
            js_out: JS_OUT,
            public_value_bits: PUBLIC_VALUE_BITS,
            value_unit,
            token: None,
            verification_key,
            tree_depth: DEFAULT_TREE_DEPTH,
            curve: Curve::default(),
        }
    }

    /// token-bound pool with default layout
    pub fn token(verification_key: VerificationKey, value_unit: u64, token: Address) -> Self {
        Self {
            token: Some(token),
            ..Self::native(verification_key, value_unit)
        }
    }

    pub fn with_tree_depth(mut self, depth: u32) -> Self {
        self.tree_depth = depth;
        self
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    /// parse and validate a toml document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// read, parse and validate a toml file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// the primary-input layout is fixed; anything else would break
    /// compatibility with externally generated proofs
    pub fn validate(&self) -> Result<()> {
        if self.js_in != JS_IN || self.js_out != JS_OUT {
            return Err(Error::Config(format!(
                "unsupported joinsplit shape {}x{} (only {}x{})",
                self.js_in, self.js_out, JS_IN, JS_OUT
            )));
        }
        if self.public_value_bits != PUBLIC_VALUE_BITS {
            return Err(Error::Config(format!(
                "public values must be {} bits, got {}",
                PUBLIC_VALUE_BITS, self.public_value_bits
            )));
        }
        if self.value_unit == 0 {
            return Err(Error::Config("value_unit must be non-zero".into()));
        }
        if self.tree_depth == 0 || self.tree_depth > MAX_TREE_DEPTH {
            return Err(Error::Config(format!(
                "tree_depth must be in 1..={}, got {}",
                MAX_TREE_DEPTH, self.tree_depth
            )));
        }
        Ok(())
    }

    pub fn num_inputs(&self) -> usize {
        NUM_INPUTS
    }

    pub fn is_native(&self) -> bool {
        self.token.is_none()
    }
}
