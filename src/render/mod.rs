pub(crate) mod composite;
pub(crate) mod display;
pub(crate) mod output;
