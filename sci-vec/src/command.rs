//! Typed command boundary for an embedding interpreter.
//!
//! The host parses its own argument syntax into a [`Command`] and runs it
//! with [`VectorStore::execute`]. Vectors are referred to by name; failures
//! come back as [`Error`]s whose `Display` is the message to show the user.

use crate::codec::{ByteOrder, NumericFormat};
use crate::error::{Error, Result};
use crate::expr::ExprHost;
use crate::notify::NotifyPolicy;
use crate::signal::{FftConfig, InverseFftConfig};
use crate::sort::SortConfig;
use crate::stats::{ElementClass, Statistic};
use crate::store::{FftTargets, VectorId, VectorStore};
use crate::vector::IndexValue;
use core::fmt;
use core::str::FromStr;
use tracing::trace;

/// Notification control requested by [`Command::Notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    /// Change the policy.
    Policy(NotifyPolicy),
    /// Notify clients immediately.
    Now,
    /// Drop a pending idle notification.
    Cancel,
    /// Report whether an idle notification is pending.
    Pending,
}

impl FromStr for NotifyAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "now" => Ok(NotifyAction::Now),
            "cancel" => Ok(NotifyAction::Cancel),
            "pending" => Ok(NotifyAction::Pending),
            other => other.parse::<NotifyPolicy>().map(NotifyAction::Policy).map_err(|_| {
                Error::invalid_arg(
                    other,
                    "expected one of always, never, whenidle, now, cancel, pending",
                )
            }),
        }
    }
}

/// Names of the vectors receiving the outputs of [`Command::Fft`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FftOutputs {
    /// Real parts.
    pub real: Option<String>,
    /// Imaginary parts.
    pub imag: Option<String>,
    /// Normalized magnitudes.
    pub spectrum: Option<String>,
    /// Phase angles.
    pub phase: Option<String>,
    /// Frequency axis.
    pub frequencies: Option<String>,
}

/// One vector verb with its arguments already typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a vector, optionally with `length` empty elements.
    Create {
        name: Option<String>,
        length: Option<usize>,
    },
    /// Destroy every named vector.
    Destroy { names: Vec<String> },
    /// List vector names.
    Names,
    /// Replace the values.
    Set { name: String, values: Vec<f64> },
    /// Append values.
    Append { name: String, values: Vec<f64> },
    /// Read every value.
    Values { name: String },
    /// Read, or set exactly, the length.
    Length { name: String, length: Option<usize> },
    /// Read, or set, the index offset.
    Offset { name: String, offset: Option<i64> },
    /// Remove every value.
    Clear { name: String },
    /// Remove the elements named by index tokens.
    Delete { name: String, indices: Vec<String> },
    /// Read an element, range or aggregate.
    Index { name: String, index: String },
    /// Write an element or fill a range.
    SetIndex {
        name: String,
        index: String,
        value: f64,
    },
    /// Remove an element or span.
    Unset { name: String, index: String },
    /// Read the values between two index tokens, backwards when
    /// `first > last`.
    Range {
        name: String,
        first: String,
        last: String,
    },
    /// Copy `source` into `target`.
    Dup { source: String, target: String },
    /// Interleave `sources` into `target`.
    Merge { target: String, sources: Vec<String> },
    /// Deal `source` round-robin into `targets`.
    Split { source: String, targets: Vec<String> },
    /// Rescale onto `[0, 1]`.
    Normalize {
        name: String,
        target: Option<String>,
    },
    /// External indices of the values within `[low, high]`.
    Search {
        name: String,
        low: f64,
        high: Option<f64>,
    },
    /// Fill with an arithmetic sequence.
    Seq {
        name: String,
        start: f64,
        stop: f64,
        step: f64,
    },
    /// Fill `target` with `source` plus interpolated points.
    Populate {
        target: String,
        source: String,
        density: usize,
    },
    /// Count the elements in a class.
    Count { name: String, class: ElementClass },
    /// External indices of the elements in a class.
    Indices { name: String, class: ElementClass },
    /// Sort `keys`, reordering `companions` alongside.
    Sort {
        keys: Vec<String>,
        companions: Vec<String>,
        config: SortConfig,
    },
    /// Evaluate an expression, storing it in `target` when given.
    Expr {
        target: Option<String>,
        expression: String,
    },
    /// Forward transform.
    Fft {
        source: String,
        outputs: FftOutputs,
        config: FftConfig,
    },
    /// Inverse transform.
    InverseFft {
        real: String,
        imag: Option<String>,
        target_real: String,
        target_imag: Option<String>,
        config: InverseFftConfig,
    },
    /// Notification control.
    Notify { name: String, action: NotifyAction },
    /// Decode a binary block into the vector.
    BinRead {
        name: String,
        bytes: Vec<u8>,
        format: NumericFormat,
        order: ByteOrder,
        at: Option<usize>,
    },
    /// Encode the vector as a binary block.
    BinWrite {
        name: String,
        format: NumericFormat,
        order: ByteOrder,
        skip_empty: bool,
    },
    /// A scalar statistic.
    Stat { name: String, statistic: Statistic },
}

/// Result of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to report.
    Empty,
    /// One number.
    Scalar(f64),
    /// A list of numbers.
    List(Vec<f64>),
    /// A vector name.
    Name(String),
    /// Several vector names.
    Names(Vec<String>),
    /// A binary block.
    Bytes(Vec<u8>),
}

impl Reply {
    fn indices(indices: Vec<i64>) -> Self {
        Reply::List(indices.into_iter().map(|i| i as f64).collect())
    }
}

impl From<IndexValue> for Reply {
    fn from(value: IndexValue) -> Self {
        match value {
            IndexValue::Scalar(x) => Reply::Scalar(x),
            IndexValue::List(values) => Reply::List(values),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }
        match self {
            Reply::Empty => Ok(()),
            Reply::Scalar(x) => write!(f, "{x}"),
            Reply::List(values) => join(f, values),
            Reply::Name(name) => f.write_str(name),
            Reply::Names(names) => join(f, names),
            Reply::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl VectorStore {
    fn ids(&self, names: &[String]) -> Result<Vec<VectorId>> {
        names.iter().map(|name| self.lookup(name)).collect()
    }

    fn optional_id(&self, name: Option<&String>) -> Result<Option<VectorId>> {
        name.map(|name| self.lookup(name)).transpose()
    }

    /// Run one command.
    pub fn execute(&mut self, command: Command, host: &mut dyn ExprHost) -> Result<Reply> {
        trace!(?command, "execute");
        match command {
            Command::Create { name, length } => {
                let id = self.create(name.as_deref())?;
                if let Some(length) = length {
                    if let Err(err) = self.update(id, |v| v.set_length(length)) {
                        self.destroy(id)?;
                        return Err(err);
                    }
                }
                Ok(Reply::Name(self.get(id)?.name().to_owned()))
            }
            Command::Destroy { names } => {
                for id in self.ids(&names)? {
                    self.destroy(id)?;
                }
                Ok(Reply::Empty)
            }
            Command::Names => Ok(Reply::Names(
                self.names().into_iter().map(str::to_owned).collect(),
            )),
            Command::Set { name, values } => {
                let id = self.lookup(&name)?;
                self.update(id, |v| v.set_values(&values))?;
                Ok(Reply::Empty)
            }
            Command::Append { name, values } => {
                let id = self.lookup(&name)?;
                self.update(id, |v| v.append(&values))?;
                Ok(Reply::Empty)
            }
            Command::Values { name } => Ok(Reply::List(self.vector_named(&name)?.values().to_vec())),
            Command::Length { name, length } => {
                let id = self.lookup(&name)?;
                if let Some(length) = length {
                    self.update(id, |v| v.set_length(length))?;
                }
                Ok(Reply::Scalar(self.get(id)?.len() as f64))
            }
            Command::Offset { name, offset } => {
                let id = self.lookup(&name)?;
                if let Some(offset) = offset {
                    self.update(id, |v| {
                        v.set_offset(offset);
                        Ok(())
                    })?;
                }
                Ok(Reply::Scalar(self.get(id)?.offset() as f64))
            }
            Command::Clear { name } => {
                let id = self.lookup(&name)?;
                self.update(id, |v| {
                    v.clear();
                    Ok(())
                })?;
                Ok(Reply::Empty)
            }
            Command::Delete { name, indices } => {
                let id = self.lookup(&name)?;
                let resolver = self.resolver().clone();
                self.update(id, |v| v.delete_indices(&resolver, &indices))?;
                Ok(Reply::Empty)
            }
            Command::Index { name, index } => {
                let value = self
                    .vector_named(&name)?
                    .read_index(self.resolver(), &index)?;
                Ok(value.into())
            }
            Command::SetIndex { name, index, value } => {
                let id = self.lookup(&name)?;
                let resolver = self.resolver().clone();
                self.update(id, |v| v.write_index(&resolver, &index, value))?;
                Ok(Reply::Empty)
            }
            Command::Unset { name, index } => {
                let id = self.lookup(&name)?;
                let resolver = self.resolver().clone();
                self.update(id, |v| v.unset_index(&resolver, &index))?;
                Ok(Reply::Empty)
            }
            Command::Range { name, first, last } => {
                let token = format!("{first}:{last}");
                let value = self
                    .vector_named(&name)?
                    .read_index(self.resolver(), &token)?;
                Ok(value.into())
            }
            Command::Dup { source, target } => {
                let (source, target) = (self.lookup(&source)?, self.lookup(&target)?);
                self.dup(source, target)?;
                Ok(Reply::Empty)
            }
            Command::Merge { target, sources } => {
                let target = self.lookup(&target)?;
                let sources = self.ids(&sources)?;
                self.merge(target, &sources)?;
                Ok(Reply::Empty)
            }
            Command::Split { source, targets } => {
                let source = self.lookup(&source)?;
                let targets = self.ids(&targets)?;
                self.split(source, &targets)?;
                Ok(Reply::Empty)
            }
            Command::Normalize { name, target } => {
                let id = self.lookup(&name)?;
                let target = self.optional_id(target.as_ref())?;
                self.normalize(id, target)?;
                Ok(Reply::Empty)
            }
            Command::Search { name, low, high } => {
                let id = self.lookup(&name)?;
                Ok(Reply::indices(self.search(id, low, high)?))
            }
            Command::Seq {
                name,
                start,
                stop,
                step,
            } => {
                let id = self.lookup(&name)?;
                self.seq(id, start, stop, step)?;
                Ok(Reply::Empty)
            }
            Command::Populate {
                target,
                source,
                density,
            } => {
                let (target, source) = (self.lookup(&target)?, self.lookup(&source)?);
                self.populate(target, source, density)?;
                Ok(Reply::Empty)
            }
            Command::Count { name, class } => {
                let id = self.lookup(&name)?;
                Ok(Reply::Scalar(self.count(id, class)? as f64))
            }
            Command::Indices { name, class } => {
                let id = self.lookup(&name)?;
                Ok(Reply::indices(self.indices(id, class)?))
            }
            Command::Sort {
                keys,
                companions,
                config,
            } => {
                let keys = self.ids(&keys)?;
                let companions = self.ids(&companions)?;
                self.sort(&keys, &companions, config)?;
                Ok(Reply::Empty)
            }
            Command::Expr { target, expression } => match target {
                Some(target) => {
                    let id = self.lookup(&target)?;
                    self.assign_expr(id, &expression, host)?;
                    Ok(Reply::Empty)
                }
                None => Ok(Reply::List(self.evaluate(&expression, host)?.into_vec())),
            },
            Command::Fft {
                source,
                outputs,
                config,
            } => {
                let source = self.lookup(&source)?;
                let targets = FftTargets {
                    real: self.optional_id(outputs.real.as_ref())?,
                    imag: self.optional_id(outputs.imag.as_ref())?,
                    spectrum: self.optional_id(outputs.spectrum.as_ref())?,
                    phase: self.optional_id(outputs.phase.as_ref())?,
                    frequencies: self.optional_id(outputs.frequencies.as_ref())?,
                };
                self.fft(source, &targets, config)?;
                Ok(Reply::Empty)
            }
            Command::InverseFft {
                real,
                imag,
                target_real,
                target_imag,
                config,
            } => {
                let real = self.lookup(&real)?;
                let imag = self.optional_id(imag.as_ref())?;
                let target_real = self.lookup(&target_real)?;
                let target_imag = self.optional_id(target_imag.as_ref())?;
                self.inverse_fft(real, imag, target_real, target_imag, config)?;
                Ok(Reply::Empty)
            }
            Command::Notify { name, action } => {
                let id = self.lookup(&name)?;
                match action {
                    NotifyAction::Policy(policy) => {
                        self.set_notify_policy(id, policy)?;
                        Ok(Reply::Empty)
                    }
                    NotifyAction::Now => {
                        self.notify_now(id)?;
                        Ok(Reply::Empty)
                    }
                    NotifyAction::Cancel => {
                        self.cancel_notify(id)?;
                        Ok(Reply::Empty)
                    }
                    NotifyAction::Pending => {
                        Ok(Reply::Scalar(f64::from(u8::from(self.is_pending(id)?))))
                    }
                }
            }
            Command::BinRead {
                name,
                bytes,
                format,
                order,
                at,
            } => {
                let id = self.lookup(&name)?;
                let read = self.binread(id, &bytes, format, order, at)?;
                Ok(Reply::Scalar(read as f64))
            }
            Command::BinWrite {
                name,
                format,
                order,
                skip_empty,
            } => {
                let id = self.lookup(&name)?;
                Ok(Reply::Bytes(self.binwrite(id, format, order, skip_empty)?))
            }
            Command::Stat { name, statistic } => {
                let id = self.lookup(&name)?;
                Ok(Reply::Scalar(self.statistic(id, statistic)?))
            }
        }
    }
}
