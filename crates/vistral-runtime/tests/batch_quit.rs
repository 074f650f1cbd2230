use std::time::Duration;

use vistral_core::event::Event;
use vistral_render::frame::Frame;
use vistral_runtime::program::{Cmd, Model};
use vistral_runtime::simulator::ProgramSimulator;
use vistral_runtime::subscription::{Every, Subscription};

#[derive(Default)]
struct ShutdownModel {
    executed_after_quit: bool,
    beats: usize,
}

#[derive(Debug)]
enum ShutdownMsg {
    QuitInBatch,
    SetExecuted,
    Beat,
}

impl From<Event> for ShutdownMsg {
    fn from(_: Event) -> Self {
        ShutdownMsg::QuitInBatch
    }
}

impl Model for ShutdownModel {
    type Message = ShutdownMsg;

    fn update(&mut self, msg: Self::Message) -> Cmd<Self::Message> {
        match msg {
            ShutdownMsg::QuitInBatch => Cmd::Batch(vec![
                Cmd::Quit,
                // Never reached: the batch stops at Quit.
                Cmd::Msg(ShutdownMsg::SetExecuted),
            ]),
            ShutdownMsg::SetExecuted => {
                self.executed_after_quit = true;
                Cmd::None
            }
            ShutdownMsg::Beat => {
                self.beats += 1;
                Cmd::None
            }
        }
    }

    fn view(&self, _frame: &mut Frame) {}

    fn subscriptions(&self) -> Vec<Box<dyn Subscription<Self::Message>>> {
        vec![Box::new(Every::new(Duration::from_millis(100), |_| {
            ShutdownMsg::Beat
        }))]
    }
}

#[test]
fn batch_stops_after_quit() {
    let mut sim = ProgramSimulator::new(ShutdownModel::default());
    sim.init();

    sim.send(ShutdownMsg::QuitInBatch);

    assert!(
        !sim.model().executed_after_quit,
        "commands after Quit in a batch must not run"
    );
    assert!(!sim.is_running());
}

#[test]
fn no_timer_fires_after_quit() {
    let mut sim = ProgramSimulator::new(ShutdownModel::default());
    sim.init();
    sim.advance(Duration::from_millis(250));
    assert_eq!(sim.model().beats, 2);

    sim.inject_event(Event::Focus(true));
    sim.advance(Duration::from_secs(10));

    assert_eq!(sim.model().beats, 2);
    assert_eq!(sim.pending_timers(), 0);
}
