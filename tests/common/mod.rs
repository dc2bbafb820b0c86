//! Helpers shared by the integration tests

pub fn ratio(total: i32, count: i32) -> i32 {
    total / count
}
