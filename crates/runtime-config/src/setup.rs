use crate::{ConfigError, ListenerSettings};
use std::time::Duration;

/// Fields of the interactive setup form, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetupField {
    #[default]
    Port,
    Subdomain,
    Timeout,
}

impl SetupField {
    pub const ALL: [SetupField; 3] = [Self::Port, Self::Subdomain, Self::Timeout];

    pub fn next(self) -> Self {
        match self {
            Self::Port => Self::Subdomain,
            Self::Subdomain => Self::Timeout,
            Self::Timeout => Self::Port,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Port => Self::Timeout,
            Self::Subdomain => Self::Port,
            Self::Timeout => Self::Subdomain,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Port => "Port",
            Self::Subdomain => "Subdomain (optional)",
            Self::Timeout => "Timeout (minutes)",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Port => "8098",
            Self::Subdomain => "my-webhook-listener",
            Self::Timeout => "30",
        }
    }

    /// Maximum characters the field accepts.
    pub fn max_len(self) -> usize {
        match self {
            Self::Port => 5,
            Self::Subdomain => 50,
            Self::Timeout => 4,
        }
    }
}

/// Raw text of the setup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupInput {
    pub port: String,
    pub subdomain: String,
    pub timeout: String,
}

/// Typed result of a submitted setup form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub port: u16,
    pub subdomain: Option<String>,
    pub timeout: Duration,
}

impl SetupInput {
    pub fn value(&self, field: SetupField) -> &str {
        match field {
            SetupField::Port => &self.port,
            SetupField::Subdomain => &self.subdomain,
            SetupField::Timeout => &self.timeout,
        }
    }

    fn value_mut(&mut self, field: SetupField) -> &mut String {
        match field {
            SetupField::Port => &mut self.port,
            SetupField::Subdomain => &mut self.subdomain,
            SetupField::Timeout => &mut self.timeout,
        }
    }

    /// Append `ch` to `field`. Returns false when the field is full or the
    /// character is a control character.
    pub fn push(&mut self, field: SetupField, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let value = self.value_mut(field);
        if value.chars().count() >= field.max_len() {
            return false;
        }
        value.push(ch);
        true
    }

    pub fn backspace(&mut self, field: SetupField) {
        self.value_mut(field).pop();
    }

    /// Turn the form into a typed config.
    ///
    /// An empty port takes the configured default; a port that is not a
    /// number in `1..=65535` is an error. The timeout falls back to the
    /// configured default when empty, unparseable, or not positive.
    pub fn resolve(&self, defaults: &ListenerSettings) -> Result<ListenerConfig, ConfigError> {
        let port_text = self.port.trim();
        let port = if port_text.is_empty() {
            defaults.default_port
        } else {
            match port_text.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort(port_text.to_string())),
            }
        };

        let subdomain = Some(self.subdomain.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let minutes = self
            .timeout
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|m| *m > 0)
            .and_then(|m| u64::try_from(m).ok())
            .unwrap_or(defaults.default_timeout_minutes);

        Ok(ListenerConfig {
            port,
            subdomain,
            timeout: Duration::from_secs(minutes.saturating_mul(60)),
        })
    }
}
