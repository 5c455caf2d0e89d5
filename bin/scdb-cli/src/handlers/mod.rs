pub(crate) mod deposit;
pub(crate) mod params;
pub(crate) mod replay;
