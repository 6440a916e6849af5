// This example assembles a small digit classifier for 28 × 28 images
// with random parameters, stores it as a binary snapshot and runs it.

// A real model would be loaded with `ModelDescriptor::load_json` from a
// file exported by a training tool.

use rand::Rng;
use convnet::{ ActivationKind, LayerKind, ModelDescriptor, Network, Settings, Tensor };

fn random(dims: &[usize], scale: f32) -> Tensor<f32> {
  let mut rng = rand::thread_rng();
  let size = dims.iter().product();
  Tensor::new(dims, (0..size).map(|_| rng.gen_range(-scale..scale) ).collect()).unwrap()
}

fn main() {
  // 1 × 28 × 28 -> conv -> 4 × 26 × 26 -> pool -> 4 × 13 × 13 -> 676 -> 32 -> 10
  let model = ModelDescriptor::new(
    vec![
      LayerKind::Input,
      LayerKind::Convoluted,
      LayerKind::Maxpool,
      LayerKind::Flatten,
      LayerKind::FullyConnected,
      LayerKind::FullyConnected,
    ],
    vec![
      ActivationKind::Relu,
      ActivationKind::Maxpool,
      ActivationKind::Flatten,
      ActivationKind::Relu,
      ActivationKind::SoftMax,
    ],
    vec![random(&[676, 32], 0.05), random(&[32, 10], 0.2)],
    vec![(0..4).map(|_| random(&[1, 3, 3], 0.5) ).collect(), vec![], vec![]],
    vec![1, 2, 1],
  ).unwrap();

  // Snapshots restore the exact same network
  let path = std::env::temp_dir().join("digits.bin");
  model.save(&path).unwrap();
  let model = ModelDescriptor::<f32>::load(&path).unwrap();

  let network = Network::new(model, Settings::default()).unwrap();

  // A blank image has no features, so every class is equally likely
  let blank = Tensor::zeros(&[1, 28, 28]);
  println!("Blank image: {}", network.infer(&blank).unwrap());

  // A vertical bar in the middle of the image
  let mut pixels = vec![0.0; 28 * 28];
  for row in 4..24 {
    pixels[row * 28 + 14] = 1.0;
  }
  let stroke = Tensor::new(&[1, 28, 28], pixels).unwrap();
  let prediction = network.classify(&stroke).unwrap();
  println!("Stroke classified as {} with probability {:.3}",
    prediction.label.unwrap_or_default(), prediction.score);
}
