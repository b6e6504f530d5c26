// src/keys.rs - Slide actions as key presses to the focused application
use crate::tracking::SlideAction;
use anyhow::{Context, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};

pub trait KeySink {
    fn press(&mut self, action: SlideAction) -> Result<()>;
}

pub fn key_for(action: SlideAction) -> Key {
    match action {
        SlideAction::PreviousSlide => Key::LeftArrow,
        SlideAction::NextSlide => Key::RightArrow,
    }
}

pub struct EnigoKeys {
    enigo: Enigo,
}

impl EnigoKeys {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow::anyhow!("Failed to connect to the input system: {}", e))?;
        Ok(Self { enigo })
    }
}

impl KeySink for EnigoKeys {
    fn press(&mut self, action: SlideAction) -> Result<()> {
        self.enigo
            .key(key_for(action), Direction::Click)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to send {}", action.as_str()))
    }
}
