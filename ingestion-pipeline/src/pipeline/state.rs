use state_machines::state_machine;

state_machine! {
    name: GenerationMachine,
    state: GenerationState,
    initial: Ready,
    states: [Ready, Extracted, Segmented, Synthesized, Failed],
    events {
        extract { transition: { from: Ready, to: Extracted } }
        segment { transition: { from: Extracted, to: Segmented } }
        synthesize { transition: { from: Segmented, to: Synthesized } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: Extracted, to: Failed }
            transition: { from: Segmented, to: Failed }
            transition: { from: Synthesized, to: Failed }
        }
    }
}

pub fn ready() -> GenerationMachine<(), Ready> {
    GenerationMachine::new(())
}
