#[cfg(feature = "std-hash")]
pub mod map {
    pub type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
    pub type HashSet<K> = std::collections::HashSet<K, ahash::RandomState>;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub type HashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;
    pub type HashSet<K> = hashbrown::HashSet<K, ahash::RandomState>;
}
