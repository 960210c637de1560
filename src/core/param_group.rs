use std::sync::Arc;

use parking_lot::Mutex;

/// A group of optimizer parameters sharing one learning rate.
///
/// The host training loop owns the groups; schedulers hold [`ParamGroupCell`] handles and
/// overwrite `learning_rate` on every step.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGroup {
    pub name: String,
    pub learning_rate: f64,
}

pub type ParamGroupCell = Arc<Mutex<ParamGroup>>;

pub trait Cellable {
    fn cell(self) -> ParamGroupCell;
}

impl ParamGroup {
    pub fn new(name: impl Into<String>, learning_rate: f64) -> Self {
        Self {
            name: name.into(),
            learning_rate,
        }
    }
}

impl Cellable for ParamGroup {
    fn cell(self) -> ParamGroupCell {
        Arc::new(Mutex::new(self))
    }
}

/// Create a [`Vec<ParamGroupCell>`] from `name => learning_rate` pairs.
#[macro_export]
macro_rules! param_groups {
    ($($name:expr => $lr:expr),* $(,)?) => {
        {
            use $crate::core::Cellable;
            vec![$($crate::core::ParamGroup::new($name, $lr).cell(),)*]
        }
    };
}
