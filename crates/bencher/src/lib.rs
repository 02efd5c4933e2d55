use bytes::Bytes;

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    payload: TestPayload,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, payload: TestPayload) -> Self {
        Self { name, group, payload }
    }

    pub fn small(name: &'static str, payload: TestPayload) -> Self {
        Self::new(name, TestGroup::Small, payload)
    }

    pub fn normal(name: &'static str, payload: TestPayload) -> Self {
        Self::new(name, TestGroup::Normal, payload)
    }

    pub fn large(name: &'static str, payload: TestPayload) -> Self {
        Self::new(name, TestGroup::Large, payload)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn payload(&self) -> &TestPayload {
        &self.payload
    }
}

/// A body described as `fragment` repeated `count` times.
#[derive(Debug, Copy, Clone)]
pub struct TestPayload {
    fragment: &'static str,
    count: u64,
}

impl TestPayload {
    pub const fn new(fragment: &'static str, count: u64) -> Self {
        Self { fragment, count }
    }

    pub fn fragment(&self) -> Bytes {
        Bytes::from_static(self.fragment.as_bytes())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn len(&self) -> u64 {
        self.fragment.len() as u64 * self.count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole body, materialized.
    pub fn body(&self) -> Bytes {
        let body = (0..self.count).map(|_| self.fragment).collect::<String>();
        Bytes::from(body)
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}
