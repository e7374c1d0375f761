// The prediction game itself: slates, scoring, standings.

pub mod leaderboard;
pub mod pick;
pub mod scoring;
