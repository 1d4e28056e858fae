use connect_four_arena::{RandomStrategy, Snapshot, Strategy};

/// Random play packaged as a loadable plugin
#[derive(Default)]
pub struct RandomPlugin {
    inner: RandomStrategy,
}

impl Strategy for RandomPlugin {
    fn decide(&self, snapshot: Snapshot) -> usize {
        self.inner.decide(snapshot)
    }
}

connect_four_arena::export_strategy!(RandomPlugin, "random plugin");
