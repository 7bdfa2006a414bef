pub mod aura;
pub mod combat;
pub mod freeze;
pub mod movement;
pub mod wave;
