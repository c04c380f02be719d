pub mod admission;
pub mod certified_admission;
pub mod other_admission;
pub mod record;
pub mod task;
pub mod user;
