//! PDF objects written by a job.
//!
//! Objects are either written as soon as they are first needed (images, patterns,
//! graphics states) or at the end of the job (fonts), see the driver.

pub(crate) mod ext_g_state;
pub(crate) mod font;
pub(crate) mod image;
pub(crate) mod tiling_pattern;
