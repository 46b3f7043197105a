pub(crate) mod xml;
pub(crate) mod zip;
