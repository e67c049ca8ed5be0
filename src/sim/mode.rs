//! Top-level game mode
//!
//! Edges only run forward: Menu → Idle → Playing → GameOver. Restarting
//! means building a new session.

use serde::{Deserialize, Serialize};

/// Current mode of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Title screen
    #[default]
    Menu,
    /// Scene laid out, waiting for the player to start
    Idle,
    /// Active gameplay
    Playing,
    /// Run ended
    GameOver,
}

/// A mode change, reported to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: GameMode,
    pub to: GameMode,
}

#[derive(Debug, Clone, Default)]
pub struct ModeMachine {
    current: GameMode,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> GameMode {
        self.current
    }

    pub fn is_playing(&self) -> bool {
        self.current == GameMode::Playing
    }

    fn enter(&mut self, to: GameMode) -> Transition {
        let from = self.current;
        self.current = to;
        log::info!("Game mode {:?} -> {:?}", from, to);
        Transition { from, to }
    }

    /// Menu → Idle
    pub fn show_idle(&mut self) -> Option<Transition> {
        match self.current {
            GameMode::Menu => Some(self.enter(GameMode::Idle)),
            _ => None,
        }
    }

    /// Menu/Idle → Playing
    pub fn start(&mut self) -> Option<Transition> {
        match self.current {
            GameMode::Menu | GameMode::Idle => Some(self.enter(GameMode::Playing)),
            GameMode::Playing | GameMode::GameOver => None,
        }
    }

    /// Playing → GameOver once the economy has latched it
    pub fn observe_game_over(&mut self, latched: bool) -> Option<Transition> {
        if latched && self.current == GameMode::Playing {
            Some(self.enter(GameMode::GameOver))
        } else {
            None
        }
    }
}
