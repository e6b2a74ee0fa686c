// 该文件是 Shouyu （手语） 项目的一部分。
// src/model/classifier.rs - 手语字母分类器
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};
use tract_onnx::prelude::{
  DatumExt, Framework, Graph, InferenceModel, InferenceModelExt, SimplePlan, Tensor, TypedFact,
  TypedOp, tvec,
};

use crate::model::{
  ClassProbability, Model,
  preprocess::ClassifierInput,
  registry::ModelDescriptor,
};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

#[derive(Error, Debug)]
pub enum ModelLoadError {
  #[error("权重文件不存在: {0}")]
  WeightsMissing(PathBuf),
  #[error("模型图无效: {0}")]
  InvalidGraph(String),
  #[error("分类头形状不匹配: 期望输出 {expected:?}, 实际 {found:?}")]
  HeadMismatch {
    expected: Vec<usize>,
    found: Vec<usize>,
  },
}

#[derive(Error, Debug)]
pub enum ClassifyError {
  #[error("输入张量形状不匹配: 期望 {expected:?}, 实际 {found:?}")]
  InputShape {
    expected: Vec<usize>,
    found: Vec<usize>,
  },
  #[error("推理失败: {0}")]
  Inference(String),
  #[error("输出长度 {0} 与类别数不符")]
  OutputShape(usize),
}

/// 已加载的分类器，推理时不使用 dropout，也不记录梯度，输出是确定的
pub struct Classifier {
  plan: Plan,
  descriptor: ModelDescriptor,
}

impl Classifier {
  /// 加载权重并校验替换后的分类头
  pub fn load(descriptor: &ModelDescriptor) -> Result<Self, ModelLoadError> {
    let path = &descriptor.weights;
    if !path.is_file() {
      return Err(ModelLoadError::WeightsMissing(path.clone()));
    }

    info!(
      "加载 {} 权重: {} (分类头: {:?})",
      descriptor.kind.token(),
      path.display(),
      descriptor.head()
    );

    let model = tract_onnx::onnx()
      .model_for_path(path)
      .map_err(|e| ModelLoadError::InvalidGraph(e.to_string()))?;
    Self::from_model(descriptor, model)
  }

  /// 从已解析的 ONNX 图构建分类器：固定输入形状、优化，并校验分类头
  pub fn from_model(
    descriptor: &ModelDescriptor,
    model: InferenceModel,
  ) -> Result<Self, ModelLoadError> {
    let input_shape = [
      1,
      3,
      descriptor.input_height as usize,
      descriptor.input_width as usize,
    ];

    let graph = model
      .with_input_fact(0, f32::fact(input_shape).into())
      .and_then(|model| model.into_optimized())
      .map_err(|e| ModelLoadError::InvalidGraph(e.to_string()))?;

    let expected = vec![1, descriptor.num_classes];
    let found = graph
      .output_fact(0)
      .map_err(|e| ModelLoadError::InvalidGraph(e.to_string()))?
      .shape
      .as_concrete()
      .map(|shape| shape.to_vec())
      .ok_or_else(|| ModelLoadError::InvalidGraph("输出形状不是常量".to_string()))?;

    // 两种分类头的输出都是 [1, 类别数]，差别只在于末尾是否带 LogSoftmax
    if found != expected {
      return Err(ModelLoadError::HeadMismatch { expected, found });
    }

    let plan = graph
      .into_runnable()
      .map_err(|e| ModelLoadError::InvalidGraph(e.to_string()))?;
    info!("模型加载完成");

    Ok(Self {
      plan,
      descriptor: descriptor.clone(),
    })
  }

  /// 前向推理并做 softmax 归一化
  pub fn classify(&self, input: &ClassifierInput) -> Result<ClassProbability, ClassifyError> {
    let expected = [
      1,
      3,
      self.descriptor.input_height as usize,
      self.descriptor.input_width as usize,
    ];
    if input.shape() != expected {
      return Err(ClassifyError::InputShape {
        expected: expected.to_vec(),
        found: input.shape().to_vec(),
      });
    }

    let tensor: Tensor = input.tensor().clone().into();
    let outputs = self
      .plan
      .run(tvec!(tensor.into()))
      .map_err(|e| ClassifyError::Inference(e.to_string()))?;

    let logits = outputs[0]
      .as_slice::<f32>()
      .map_err(|e| ClassifyError::Inference(e.to_string()))?;
    debug!("模型输出: {:?}", logits);

    ClassProbability::from_logits(logits).ok_or(ClassifyError::OutputShape(logits.len()))
  }
}

impl Model for Classifier {
  type Input = ClassifierInput;
  type Output = ClassProbability;
  type Error = ClassifyError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    self.classify(input)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{preprocess, registry::resolve};
  use image::{Rgb, RgbImage};
  use tract_onnx::pb::{
    GraphProto, ModelProto, NodeProto, OperatorSetIdProto, TensorProto, TensorShapeProto,
    TypeProto, ValueInfoProto,
    tensor_proto::DataType,
    tensor_shape_proto::{Dimension, dimension},
    type_proto,
  };

  fn node(op_type: &str, input: &[&str], output: &str) -> NodeProto {
    NodeProto {
      op_type: op_type.to_string(),
      input: input.iter().map(|s| s.to_string()).collect(),
      output: vec![output.to_string()],
      name: output.to_string(),
      ..Default::default()
    }
  }

  /// 全局平均池化后接一个 3 × classes 的线性层，输出 `[1, classes]`
  fn linear_head(classes: usize) -> InferenceModel {
    let weights = (0..3 * classes)
      .map(|i| ((i * 7) % 11) as f32 * 0.1 - 0.5)
      .collect();
    let input_dims = [1i64, 3, 224, 224]
      .into_iter()
      .map(|d| Dimension {
        value: Some(dimension::Value::DimValue(d)),
        ..Default::default()
      })
      .collect();

    let graph = GraphProto {
      name: "linear_head".to_string(),
      node: vec![
        node("GlobalAveragePool", &["input"], "pooled"),
        node("Flatten", &["pooled"], "features"),
        node("MatMul", &["features", "weights"], "logits"),
      ],
      initializer: vec![TensorProto {
        name: "weights".to_string(),
        dims: vec![3, classes as i64],
        data_type: DataType::Float as i32,
        float_data: weights,
        ..Default::default()
      }],
      input: vec![ValueInfoProto {
        name: "input".to_string(),
        r#type: Some(TypeProto {
          value: Some(type_proto::Value::TensorType(type_proto::Tensor {
            elem_type: DataType::Float as i32,
            shape: Some(TensorShapeProto { dim: input_dims }),
          })),
          ..Default::default()
        }),
        ..Default::default()
      }],
      output: vec![ValueInfoProto {
        name: "logits".to_string(),
        ..Default::default()
      }],
      ..Default::default()
    };
    let proto = ModelProto {
      ir_version: 7,
      opset_import: vec![OperatorSetIdProto {
        domain: String::new(),
        version: 13,
      }],
      graph: Some(graph),
      ..Default::default()
    };
    tract_onnx::onnx().model_for_proto_model(&proto).unwrap()
  }

  fn sample_input() -> ClassifierInput {
    let image = RgbImage::from_fn(96, 64, |x, y| Rgb([(x * 2) as u8, (y * 3) as u8, 90]));
    preprocess::normalize(&image, 224, 224)
  }

  #[test]
  fn same_input_gives_same_prediction() {
    let descriptor = resolve("resnet").unwrap();
    let classifier = Classifier::from_model(&descriptor, linear_head(21)).unwrap();
    let input = sample_input();

    let first = classifier.classify(&input).unwrap();
    let second = classifier.classify(&input).unwrap();
    assert_eq!(first.probabilities(), second.probabilities());
    assert_eq!(first.top1(), second.top1());

    let sum: f32 = first.probabilities().iter().sum();
    assert!((sum - 1.0).abs() < 1e-5);
  }

  #[test]
  fn wrong_input_shape_is_rejected() {
    let descriptor = resolve("resnet").unwrap();
    let classifier = Classifier::from_model(&descriptor, linear_head(21)).unwrap();
    let image = RgbImage::new(32, 32);
    let input = preprocess::normalize(&image, 112, 112);
    assert!(matches!(
      classifier.classify(&input),
      Err(ClassifyError::InputShape { .. })
    ));
  }

  #[test]
  fn head_with_wrong_class_count_is_rejected() {
    let descriptor = resolve("convnext").unwrap();
    match Classifier::from_model(&descriptor, linear_head(20)) {
      Err(ModelLoadError::HeadMismatch { expected, found }) => {
        assert_eq!(expected, vec![1, 21]);
        assert_eq!(found, vec![1, 20]);
      }
      other => panic!("unexpected result: {:?}", other.err()),
    }
  }

  #[test]
  fn missing_weights_is_load_error() {
    let descriptor = resolve("resnet")
      .unwrap()
      .with_weights_dir(&std::env::temp_dir().join("shouyu-no-such-dir"));
    match Classifier::load(&descriptor) {
      Err(ModelLoadError::WeightsMissing(path)) => assert_eq!(path, descriptor.weights),
      other => panic!("unexpected result: {:?}", other.err()),
    }
  }

  #[test]
  fn corrupt_weights_is_load_error() {
    let dir = std::env::temp_dir().join(format!("shouyu-corrupt-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let descriptor = resolve("vgg").unwrap().with_weights_dir(&dir);
    std::fs::write(&descriptor.weights, b"definitely not a protobuf graph").unwrap();

    let result = Classifier::load(&descriptor);
    std::fs::remove_dir_all(&dir).ok();
    assert!(matches!(result, Err(ModelLoadError::InvalidGraph(_))));
  }
}
