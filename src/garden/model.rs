use crate::bus::ItemPlacement;

/// Mutable game state shared between the garden phases. Phases hold cloned
/// `Rc<RefCell<GardenModel>>` handles; event listeners never touch it
/// directly, they route through pending actions drained by the game.
#[derive(Debug, Default)]
pub struct GardenModel {
    current_level: u32,
    placed: Vec<ItemPlacement>,
    score: u32,
    complete: bool,
}

impl GardenModel {
    pub fn new() -> GardenModel {
        GardenModel::default()
    }

    pub fn current_level(&self) -> u32 {
        self.current_level
    }

    pub fn set_level(&mut self, level: u32) {
        self.current_level = level;
    }

    pub fn add_placed(&mut self, placement: ItemPlacement) {
        self.placed.push(placement);
    }

    pub fn remove_placed(&mut self, id: &str) -> Option<ItemPlacement> {
        let index = self.placed.iter().position(|p| p.id == id)?;
        Some(self.placed.remove(index))
    }

    pub fn placed(&self) -> &[ItemPlacement] {
        &self.placed
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    pub fn find(&self, id: &str) -> Option<&ItemPlacement> {
        self.placed.iter().find(|p| p.id == id)
    }

    pub fn add_score(&mut self, points: u32) {
        self.score += points;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn set_complete(&mut self, complete: bool) {
        self.complete = complete;
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Back to a fresh game.
    pub fn reset(&mut self) {
        *self = GardenModel::default();
    }
}
