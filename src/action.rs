#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    CycleTheme,
    None,
}
