pub(crate) mod scheduler;
pub(crate) mod view;
