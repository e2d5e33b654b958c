pub mod detect;
pub mod dummy;
pub mod inspect;
