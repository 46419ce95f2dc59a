use clap::Parser;

use crate::preprocess::Layout;

#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ONNX model path or http(s) URL
    #[arg(long, env = "LEAFCHECK_MODEL")]
    pub model: String,

    /// Class label file, one label per line in model output order
    #[arg(long, env = "LEAFCHECK_LABELS")]
    pub labels: Option<String>,

    #[arg(long, env = "LEAFCHECK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "LEAFCHECK_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Run on the CUDA execution provider
    #[arg(long, env = "LEAFCHECK_CUDA")]
    pub cuda: bool,

    /// Square input resolution expected by the model
    #[arg(long, default_value_t = 224)]
    pub input_size: usize,

    #[arg(long, value_enum, default_value_t = Layout::Nhwc)]
    pub layout: Layout,

    /// Apply softmax to model outputs
    #[arg(long)]
    pub softmax: bool,

    /// Number of ranked predictions in each response
    #[arg(long, default_value_t = 3)]
    pub top_k: usize,

    /// Minimum retained confidence for plant filtering to take effect
    #[arg(long, default_value_t = 0.15)]
    pub min_plant_mass: f32,

    /// Primary confidence under which a warning is attached
    #[arg(long, default_value_t = 0.5)]
    pub low_confidence: f32,

    #[arg(long, default_value_t = 10)]
    pub max_upload_mb: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["leafcheck", "--model", "plant.onnx"]).unwrap();
        assert_eq!(args.port, 5001);
        assert_eq!(args.input_size, 224);
        assert_eq!(args.layout, Layout::Nhwc);
        assert_eq!(args.top_k, 3);
        assert!((args.min_plant_mass - 0.15).abs() < f32::EPSILON);
        assert!(!args.softmax);
    }

    #[test]
    fn overrides() {
        let args = Args::try_parse_from([
            "leafcheck", "--model", "https://example.com/m.onnx", "--layout", "nchw", "--top-k", "5", "--softmax",
        ])
        .unwrap();
        assert_eq!(args.layout, Layout::Nchw);
        assert_eq!(args.top_k, 5);
        assert!(args.softmax);
    }
}
