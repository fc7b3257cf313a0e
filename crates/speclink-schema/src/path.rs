use std::fmt;

use speclink_model::escape;

/// Location inside an instance, built up while descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstancePath {
    tokens: Vec<String>,
}

impl InstancePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }

    pub fn pop(&mut self) {
        self.tokens.pop();
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", escape(token))?;
        }
        Ok(())
    }
}
