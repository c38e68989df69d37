use strum_macros::{Display, EnumIter};

/// Phases of a takeoff maneuver.
///
/// The timed hover strategy walks `Arm -> Pause -> Ramp -> Done`, the switch release
/// strategy only `Ramp -> Done`. `Done` is terminal until the next `prepare_for_takeover`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TakeoffState {
    Arm,
    Pause,
    Ramp,
    Done,
}

impl TakeoffState {
    /// States a maneuver may move to from `self` within one cycle.
    pub fn successors(self) -> &'static [TakeoffState] {
        match self {
            TakeoffState::Arm => &[TakeoffState::Arm, TakeoffState::Pause],
            TakeoffState::Pause => &[TakeoffState::Pause, TakeoffState::Ramp],
            TakeoffState::Ramp => &[TakeoffState::Ramp, TakeoffState::Done],
            TakeoffState::Done => &[],
        }
    }

    pub fn is_terminal(self) -> bool { self == TakeoffState::Done }
}
