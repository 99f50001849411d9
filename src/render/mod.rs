pub(crate) mod canvas;
pub(crate) mod fit;
