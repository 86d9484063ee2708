//! Provider chain primitives
//!
//! Authentication and federation run an ordered list of providers. Each provider
//! either declines the input, accepts it, or rejects it. The first acceptance
//! ends the chain; rejections are remembered and the chain moves on.

use crate::error::AuthError;

/// Result of offering an input to one provider
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The provider does not handle this kind of input
    Decline,

    /// The provider handled the input successfully
    Accept(T),

    /// The provider handled the input and refused it
    Reject(AuthError),
}

impl<T> Outcome<T> {
    /// Turn a handled result into an accept or a reject
    pub fn from_result(result: Result<T, AuthError>) -> Self {
        match result {
            Ok(value) => Outcome::Accept(value),
            Err(err) => Outcome::Reject(err),
        }
    }

    /// Short label for log fields
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Decline => "decline",
            Outcome::Accept(_) => "accept",
            Outcome::Reject(_) => "reject",
        }
    }
}

/// Accumulator for a first-accept chain
#[derive(Debug, Default)]
pub struct ChainFold {
    rejection: Option<AuthError>,
    handled: usize,
}

impl ChainFold {
    /// Start an empty fold
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one provider outcome; returns the value when it is an acceptance
    pub fn observe<T>(&mut self, outcome: Outcome<T>) -> Option<T> {
        match outcome {
            Outcome::Accept(value) => Some(value),
            Outcome::Reject(err) => {
                self.handled += 1;
                self.rejection = Some(err);
                None
            }
            Outcome::Decline => None,
        }
    }

    /// Number of providers that rejected so far
    pub fn rejections(&self) -> usize {
        self.handled
    }

    /// Failure once no provider accepted: the latest rejection, or
    /// [`AuthError::NoApplicableProvider`] when every provider declined
    pub fn finish(self) -> AuthError {
        self.rejection.unwrap_or(AuthError::NoApplicableProvider)
    }
}
