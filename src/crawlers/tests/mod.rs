mod mock;

pub(crate) use mock::{MockFetcher, listing};
