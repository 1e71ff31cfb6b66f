mod proxy;

pub use proxy::{Proxy, ProxyError, ProxySettings};
