pub mod hit;
pub mod scene;
pub mod transform;

pub use hit::{Hit, hit_test, hit_test_rect};
pub use scene::SvgScene;
