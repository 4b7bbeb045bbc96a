#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControlId(u32);

impl ControlId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }
}

pub const INPUT_PROMPT: ControlId = ControlId::new(1001);
pub const BUTTON_START: ControlId = ControlId::new(1002);
pub const BUTTON_CONFIRM: ControlId = ControlId::new(1003);
pub const BUTTON_STOP: ControlId = ControlId::new(1004);
pub const INPUT_REPLY: ControlId = ControlId::new(1005);
pub const SELECT_LANGUAGE: ControlId = ControlId::new(1006);
pub const LIST_LOG: ControlId = ControlId::new(1501);
pub const LABEL_TITLE: ControlId = ControlId::new(3000);
pub const LABEL_STATUS_CAPTION: ControlId = ControlId::new(3001);
pub const LABEL_STATUS: ControlId = ControlId::new(3002);
pub const LABEL_LOG_CAPTION: ControlId = ControlId::new(3003);
pub const LABEL_ALERT: ControlId = ControlId::new(3004);
