//! Which surface events the session acts on while an input method composes.

/// Where the session stands relative to input-method composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// Between composition-start and composition-end. The surface holds
    /// provisional text that must not be read back.
    Composing,
    /// Composition ended and the surface has not been read back yet.
    AwaitingSync,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CompositionStart,
    CompositionEnd,
    Input,
    SelectionChange,
    SyncDone,
}

/// What the session does with the event that caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Process,
    Suppress,
    /// Read the surface back once.
    Sync,
    SyncThenProcess,
    Nothing,
}

impl Phase {
    pub fn next(self, event: Event) -> (Phase, Action) {
        use Action::*;
        use Event::*;

        match (self, event) {
            (_, CompositionStart) => (Phase::Composing, Suppress),

            (Phase::Idle, Input | SelectionChange) => (Phase::Idle, Process),
            (Phase::Idle, CompositionEnd | SyncDone) => (Phase::Idle, Nothing),

            (Phase::Composing, Input | SelectionChange) => (Phase::Composing, Suppress),
            (Phase::Composing, CompositionEnd) => (Phase::AwaitingSync, Sync),
            (Phase::Composing, SyncDone) => (Phase::Composing, Nothing),

            (Phase::AwaitingSync, Input | SelectionChange) => {
                (Phase::AwaitingSync, SyncThenProcess)
            }
            (Phase::AwaitingSync, CompositionEnd) => (Phase::AwaitingSync, Sync),
            (Phase::AwaitingSync, SyncDone) => (Phase::Idle, Nothing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Phase::Idle, Event::CompositionStart, Phase::Composing, Action::Suppress)]
    #[case(Phase::Composing, Event::Input, Phase::Composing, Action::Suppress)]
    #[case(Phase::Composing, Event::SelectionChange, Phase::Composing, Action::Suppress)]
    #[case(Phase::Composing, Event::CompositionEnd, Phase::AwaitingSync, Action::Sync)]
    #[case(Phase::AwaitingSync, Event::SyncDone, Phase::Idle, Action::Nothing)]
    #[case(Phase::Idle, Event::Input, Phase::Idle, Action::Process)]
    #[case(Phase::Idle, Event::SelectionChange, Phase::Idle, Action::Process)]
    #[case(Phase::AwaitingSync, Event::Input, Phase::AwaitingSync, Action::SyncThenProcess)]
    #[case(
        Phase::AwaitingSync,
        Event::SelectionChange,
        Phase::AwaitingSync,
        Action::SyncThenProcess
    )]
    #[case(Phase::Idle, Event::CompositionEnd, Phase::Idle, Action::Nothing)]
    fn transitions(
        #[case] from: Phase,
        #[case] event: Event,
        #[case] to: Phase,
        #[case] action: Action,
    ) {
        assert_eq!(from.next(event), (to, action));
    }

    #[test]
    fn composition_round_trip_ends_idle() {
        let events = [
            Event::CompositionStart,
            Event::Input,
            Event::Input,
            Event::CompositionEnd,
            Event::SyncDone,
        ];
        let actions: Vec<Action> = events
            .iter()
            .scan(Phase::Idle, |phase, &event| {
                let (next, action) = phase.next(event);
                *phase = next;
                Some(action)
            })
            .collect();
        assert_eq!(
            actions,
            vec![
                Action::Suppress,
                Action::Suppress,
                Action::Suppress,
                Action::Sync,
                Action::Nothing,
            ]
        );
        let end = events
            .iter()
            .fold(Phase::Idle, |phase, &event| phase.next(event).0);
        assert_eq!(end, Phase::Idle);
    }
}
