pub mod model_loaders;
