pub mod constants;
pub mod events;
pub mod game_loop;
pub mod session;
pub mod skills;
pub mod snapshot;
pub mod state;
pub mod systems;
