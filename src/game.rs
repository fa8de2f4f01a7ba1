use async_trait::async_trait;

use crate::app::Core;
use crate::phase::PhaseError;

/// A game hosted by the application loop. `init` registers phases and bus
/// listeners, `start` enters the first phase, `update` runs once per frame
/// with the fixed step, `dispose` releases everything `init` registered.
#[async_trait(?Send)]
pub trait Game {
    fn init(&mut self, core: &mut Core);

    async fn start(&mut self, core: &mut Core) -> Result<(), PhaseError>;

    async fn update(&mut self, delta: f32, core: &mut Core);

    fn dispose(&mut self, core: &mut Core);
}
