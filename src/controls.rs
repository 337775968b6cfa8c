//! State of the "go to my location" map button
use crate::follow::FollowConfig;
use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Normal,
    Clicked,
    Following,
}

impl ButtonState {
    pub fn glyph(self) -> &'static str {
        match self {
            ButtonState::Normal => "⌖",
            ButtonState::Clicked => "⊕",
            ButtonState::Following => "🎯",
        }
    }
}

/// What the session should do after a press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonAction {
    GoToLocation,
    FollowStart,
    FollowEnd,
}

/// Id of a revert timer, the host calls back with it once the delay elapsed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Press {
    pub action: ButtonAction,
    /// schedule [`GotoButton::on_timer`] with this id after the delay in ms
    pub revert_after: Option<(TimerId, u64)>,
}

#[derive(Debug)]
pub struct GotoButton {
    state: ButtonState,
    longpress_ms: u64,
    clicked_timeout_ms: u64,
    revert_timer: Option<TimerId>,
    next_timer: u64,
}

impl GotoButton {
    pub fn new(config: &FollowConfig) -> Self {
        GotoButton {
            state: ButtonState::Normal,
            longpress_ms: config.longpress,
            clicked_timeout_ms: config.clicked_timeout,
            revert_timer: None,
            next_timer: 0,
        }
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn glyph(&self) -> &'static str {
        self.state.glyph()
    }

    /// Match the button to the follow mode of the session, which can change without
    /// the button (e.g. `follow_end` called by the host). A pending click revert is kept.
    pub fn sync_following(&mut self, following: bool) {
        match (following, self.state) {
            (true, ButtonState::Following) | (false, ButtonState::Normal) => {}
            (false, ButtonState::Clicked) => {}
            (true, _) => {
                self.state = ButtonState::Following;
                self.revert_timer = None;
            }
            (false, ButtonState::Following) => self.state = ButtonState::Normal,
        }
    }

    /// Handle a press released after `held_ms`
    pub fn press(&mut self, held_ms: u64) -> Press {
        if self.state == ButtonState::Following {
            debug!("tap while following");
            self.state = ButtonState::Normal;
            self.revert_timer = None;
            return Press {
                action: ButtonAction::FollowEnd,
                revert_after: None,
            };
        }
        if held_ms >= self.longpress_ms {
            debug!("long press ({} ms)", held_ms);
            self.state = ButtonState::Following;
            self.revert_timer = None;
            return Press {
                action: ButtonAction::FollowStart,
                revert_after: None,
            };
        }

        // a new click supersedes the pending revert
        self.next_timer += 1;
        let timer = TimerId(self.next_timer);
        self.revert_timer = Some(timer);
        self.state = ButtonState::Clicked;
        Press {
            action: ButtonAction::GoToLocation,
            revert_after: Some((timer, self.clicked_timeout_ms)),
        }
    }

    /// Revert click feedback, stale timers are ignored
    pub fn on_timer(&mut self, timer: TimerId) {
        if self.revert_timer != Some(timer) {
            return;
        }
        self.revert_timer = None;
        if self.state == ButtonState::Clicked {
            self.state = ButtonState::Normal;
        }
    }
}
