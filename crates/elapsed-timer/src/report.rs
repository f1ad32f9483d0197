use std::fmt;
use std::time::Duration;

/// Aggregate of every finished timing recorded under one name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report<'a> {
    pub name: &'a str,
    pub count: usize,
    pub sum: Duration,
    pub mean: Duration,
}

impl<'a> Report<'a> {
    pub(crate) fn new(name: &'a str, count: usize, sum: Duration) -> Self {
        let mean = if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(sum.as_secs_f64() / count as f64)
        };
        Self {
            name,
            count,
            sum,
            mean,
        }
    }
}

/// `name: n:COUNT sum:SECONDS ave:SECONDS`, seconds with five decimals.
impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: n:{} sum:{:.5} ave:{:.5}",
            self.name,
            self.count,
            self.sum.as_secs_f64(),
            self.mean.as_secs_f64()
        )
    }
}
