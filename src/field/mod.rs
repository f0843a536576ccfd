pub(crate) mod control;
pub(crate) mod template;
