pub mod lda;
pub mod normalize;
pub mod params;
pub mod rng;
pub mod tsne;
pub mod vectorize;
