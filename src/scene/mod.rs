/// Scenes and the scene list.
pub mod graph;
