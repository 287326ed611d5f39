pub mod audit;
pub mod cv;
pub mod generation;
pub mod linkedin;
pub mod subscription;
