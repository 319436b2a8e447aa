use std::{
    fmt::{self, Display},
    str::FromStr,
};

use anyhow::{bail, ensure, Context, Result};
use bitstream::BitStream;

/// One entry of a field layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Bool,
    Unsigned(u32),
    Signed(u32),
    F32,
    F64,
    /// Move to the next multiple of this many bytes.
    Align(usize),
    /// Move the cursor by this many bits.
    Skip(isize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

/// Comma separated list of fields, such as `bool,u12,align4,f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub fields: Vec<Field>,
}

/// A field paired with the value to pack into it, such as `u12=0xABC`.
/// Cursor movements carry no value.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub field: Field,
    pub value: Option<Value>,
}

impl Field {
    /// Decodes the field at the cursor. Cursor movements yield `None`.
    pub fn read(&self, stream: &mut BitStream) -> Result<Option<Value>> {
        Ok(Some(match *self {
            Field::Bool => Value::Bool(stream.read()?),
            Field::Unsigned(bits) => Value::Unsigned(stream.read_uint(bits)?),
            Field::Signed(bits) => Value::Signed(sign_extend(stream.read_uint(bits)?, bits)),
            Field::F32 => Value::Float(stream.read::<f32>()? as f64),
            Field::F64 => Value::Float(stream.read()?),
            Field::Align(bytes) => {
                stream.align(bytes);
                return Ok(None);
            }
            Field::Skip(bits) => {
                stream.skip(bits);
                return Ok(None);
            }
        }))
    }

    /// Parses the textual value for this field, checking it fits the width.
    pub fn parse_value(&self, value: &str) -> Result<Value> {
        Ok(match *self {
            Field::Bool => Value::Bool(match value {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => bail!("`{value}` is not a boolean"),
            }),
            Field::Unsigned(bits) => {
                let value = parse_unsigned(value)?;
                ensure!(
                    bits == u64::BITS || value >> bits == 0,
                    "{value} does not fit in {bits} bits"
                );
                Value::Unsigned(value)
            }
            Field::Signed(bits) => {
                let value = parse_signed(value)?;
                let half = 1_i128 << (bits - 1);
                ensure!(
                    (-half..half).contains(&(value as i128)),
                    "{value} does not fit in {bits} signed bits"
                );
                Value::Signed(value)
            }
            Field::F32 | Field::F64 => {
                let parsed = value
                    .parse::<f64>()
                    .with_context(|| format!("`{value}` is not a number"))?;
                ensure!(
                    *self == Field::F64 || !parsed.is_finite() || (parsed as f32).is_finite(),
                    "{value} does not fit in an f32"
                );
                Value::Float(parsed)
            }
            Field::Align(_) | Field::Skip(_) => bail!("`{self}` does not take a value"),
        })
    }

    fn takes_value(&self) -> bool {
        !matches!(self, Field::Align(_) | Field::Skip(_))
    }
}

impl Entry {
    /// Appends the entry at the cursor. Cursor movements pad with zero bits
    /// so the packed output always covers them.
    pub fn write(&self, stream: &mut BitStream) -> Result<()> {
        match (self.field, self.value) {
            (Field::Bool, Some(Value::Bool(value))) => stream.write(value)?,
            (Field::Unsigned(bits), Some(Value::Unsigned(value))) => {
                stream.write_uint(value, bits)?
            }
            (Field::Signed(bits), Some(Value::Signed(value))) => {
                stream.write_uint(value as u64, bits)?
            }
            (Field::F32, Some(Value::Float(value))) => stream.write(value as f32)?,
            (Field::F64, Some(Value::Float(value))) => stream.write(value)?,
            (Field::Align(bytes), None) => {
                let bits = bytes
                    .checked_mul(8)
                    .with_context(|| format!("Alignment of {bytes} bytes is too large"))?;
                if bits > 0 {
                    stream.reserve((bits - stream.tell() % bits) % bits)?;
                }
            }
            (Field::Skip(bits), None) if bits >= 0 => {
                stream.reserve(bits as usize)?;
            }
            (Field::Skip(bits), None) => stream.skip(bits),
            (field, value) => bail!("{value:?} cannot be written as `{field}`"),
        }

        Ok(())
    }
}

fn sign_extend(raw: u64, bits: u32) -> i64 {
    if bits == 0 {
        return 0;
    }

    let shift = u64::BITS - bits;
    ((raw << shift) as i64) >> shift
}

fn parse_width(width: &str, field: &str) -> Result<u32> {
    let bits = width
        .parse::<u32>()
        .with_context(|| format!("Invalid width in `{field}`"))?;
    ensure!(
        (1..=64).contains(&bits),
        "Width of `{field}` must be between 1 and 64 bits"
    );
    Ok(bits)
}

fn parse_unsigned(value: &str) -> Result<u64> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.with_context(|| format!("`{value}` is not an unsigned integer"))
}

fn parse_signed(value: &str) -> Result<i64> {
    let (negative, digits) = match value.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, value),
    };

    let magnitude = parse_unsigned(digits)? as i128;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).with_context(|| format!("`{value}` is out of range"))
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Ok(match s {
            "bool" => Field::Bool,
            "f32" => Field::F32,
            "f64" => Field::F64,
            _ => {
                if let Some(bytes) = s.strip_prefix("align") {
                    Field::Align(
                        bytes
                            .parse()
                            .with_context(|| format!("Invalid alignment in `{s}`"))?,
                    )
                } else if let Some(bits) = s.strip_prefix("skip") {
                    Field::Skip(
                        bits.parse()
                            .with_context(|| format!("Invalid distance in `{s}`"))?,
                    )
                } else if let Some(width) = s.strip_prefix('u') {
                    Field::Unsigned(parse_width(width, s)?)
                } else if let Some(width) = s.strip_prefix('i') {
                    Field::Signed(parse_width(width, s)?)
                } else {
                    bail!("Unknown field `{s}`")
                }
            }
        })
    }
}

impl FromStr for Layout {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields = s
            .split(',')
            .filter(|field| !field.trim().is_empty())
            .map(Field::from_str)
            .collect::<Result<Vec<_>>>()?;
        ensure!(!fields.is_empty(), "Layout has no fields");
        Ok(Self { fields })
    }
}

impl FromStr for Entry {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (field, value) = match s.split_once('=') {
            Some((field, value)) => (field.parse::<Field>()?, Some(value.trim())),
            None => (s.parse::<Field>()?, None),
        };

        let value = match (field.takes_value(), value) {
            (true, Some(value)) => Some(field.parse_value(value)?),
            (false, None) => None,
            (true, None) => bail!("`{field}` needs a value, as in `{field}=...`"),
            (false, Some(_)) => bail!("`{field}` does not take a value"),
        };

        Ok(Self { field, value })
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Bool => f.write_str("bool"),
            Field::Unsigned(bits) => write!(f, "u{bits}"),
            Field::Signed(bits) => write!(f, "i{bits}"),
            Field::F32 => f.write_str("f32"),
            Field::F64 => f.write_str("f64"),
            Field::Align(bytes) => write!(f, "align{bytes}"),
            Field::Skip(bits) => write!(f, "skip{bits}"),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Unsigned(value) => write!(f, "{value} (0x{value:X})"),
            Value::Signed(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
        }
    }
}
