mod island;
pub use self::island::IslandRemover;

mod interpolate;
pub use self::interpolate::Interpolator;
