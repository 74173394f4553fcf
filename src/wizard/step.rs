use std::fmt;
use std::sync::Arc;

use super::StepContext;

/// Navigation controls rendered beneath every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
    Back,
    Cancel,
    Clear,
    Next,
    Finish,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Back,
        Control::Cancel,
        Control::Clear,
        Control::Next,
        Control::Finish,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::Back => "back",
            Control::Cancel => "cancel",
            Control::Clear => "clear",
            Control::Next => "next",
            Control::Finish => "finish",
        }
    }
}

/// One boolean per navigation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlFlags {
    pub back: bool,
    pub cancel: bool,
    pub clear: bool,
    pub next: bool,
    pub finish: bool,
}

impl ControlFlags {
    pub const NONE: ControlFlags = ControlFlags {
        back: false,
        cancel: false,
        clear: false,
        next: false,
        finish: false,
    };

    pub fn get(&self, control: Control) -> bool {
        match control {
            Control::Back => self.back,
            Control::Cancel => self.cancel,
            Control::Clear => self.clear,
            Control::Next => self.next,
            Control::Finish => self.finish,
        }
    }

    pub fn set(&mut self, control: Control, value: bool) {
        match control {
            Control::Back => self.back = value,
            Control::Cancel => self.cancel = value,
            Control::Clear => self.clear = value,
            Control::Next => self.next = value,
            Control::Finish => self.finish = value,
        }
    }
}

/// Visibility and enablement of the navigation controls for the active step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationControls {
    pub shown: ControlFlags,
    pub enabled: ControlFlags,
}

impl NavigationControls {
    /// A control accepts its command only when it is both shown and enabled.
    pub fn is_active(&self, control: Control) -> bool {
        self.shown.get(control) && self.enabled.get(control)
    }
}

/// Which control-state rule governs a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRule {
    AmountSelection,
    BankInfo,
    Verify,
    Terminal,
}

/// Source and target of a step change. `from` is `None` on page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<u8>,
    pub to: u8,
}

impl Transition {
    pub fn is_forward(&self) -> bool {
        self.from.map_or(true, |from| self.to > from)
    }
}

pub type TransitionHook = Arc<dyn Fn(&mut StepContext, Transition) + Send + Sync>;
pub type StateHook = Arc<dyn Fn(&mut StepContext) + Send + Sync>;

/// Optional lifecycle callbacks. An absent slot is a no-op.
#[derive(Clone, Default)]
pub struct StepHooks {
    pub enter: Option<TransitionHook>,
    pub enter_set_state: Option<StateHook>,
    pub leave: Option<TransitionHook>,
    pub leave_set_state: Option<StateHook>,
    pub clear: Option<StateHook>,
}

impl fmt::Debug for StepHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepHooks")
            .field("enter", &self.enter.is_some())
            .field("enter_set_state", &self.enter_set_state.is_some())
            .field("leave", &self.leave.is_some())
            .field("leave_set_state", &self.leave_set_state.is_some())
            .field("clear", &self.clear.is_some())
            .finish()
    }
}

/// Declarative description of a single wizard step.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub index: u8,
    pub title: String,
    pub page_title: String,
    pub banner_text: Option<String>,
    /// When false the whole control bar is hidden.
    pub show_controls: bool,
    pub show_buttons: ControlFlags,
    pub enable_controls: ControlFlags,
    pub rule: StepRule,
    pub hooks: StepHooks,
}

impl StepDefinition {
    pub fn new(index: u8, title: impl Into<String>, rule: StepRule) -> Self {
        let title = title.into();
        Self {
            index,
            page_title: title.clone(),
            title,
            banner_text: None,
            show_controls: true,
            show_buttons: ControlFlags::NONE,
            enable_controls: ControlFlags::NONE,
            rule,
            hooks: StepHooks::default(),
        }
    }

    pub fn with_page_title(mut self, page_title: impl Into<String>) -> Self {
        self.page_title = page_title.into();
        self
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner_text = Some(banner.into());
        self
    }

    /// Shows and enables the same set of controls.
    pub fn with_controls(mut self, flags: ControlFlags) -> Self {
        self.show_buttons = flags;
        self.enable_controls = flags;
        self.show_controls = flags != ControlFlags::NONE;
        self
    }

    pub fn with_enabled(mut self, flags: ControlFlags) -> Self {
        self.enable_controls = flags;
        self
    }

    pub fn on_enter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StepContext, Transition) + Send + Sync + 'static,
    {
        self.hooks.enter = Some(Arc::new(hook));
        self
    }

    pub fn on_enter_set_state<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StepContext) + Send + Sync + 'static,
    {
        self.hooks.enter_set_state = Some(Arc::new(hook));
        self
    }

    pub fn on_leave<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StepContext, Transition) + Send + Sync + 'static,
    {
        self.hooks.leave = Some(Arc::new(hook));
        self
    }

    pub fn on_leave_set_state<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StepContext) + Send + Sync + 'static,
    {
        self.hooks.leave_set_state = Some(Arc::new(hook));
        self
    }

    pub fn on_clear<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut StepContext) + Send + Sync + 'static,
    {
        self.hooks.clear = Some(Arc::new(hook));
        self
    }

    /// Control bar state applied when this step becomes active.
    pub fn base_controls(&self) -> NavigationControls {
        if self.show_controls {
            NavigationControls {
                shown: self.show_buttons,
                enabled: self.enable_controls,
            }
        } else {
            NavigationControls::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rule == StepRule::Terminal
    }
}
