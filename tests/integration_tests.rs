// SPDX-License-Identifier: MIT

//! Integration tests for condition decoding, resolution and evaluation
//!
//! These tests exercise the public API end to end using mock adapters.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::error::Error;
use std::sync::{Arc, Mutex};
use taco_rs::sdk::{CallRequest, ChainProvider, ConditionError, LeafExecutor, Signer};
use taco_rs::taco::conditions::{
    Comparator, CompoundCondition, Condition, ConditionType, ConditionVariable,
    IfThenElseCondition, ReturnValueTest, SequentialCondition, TimeCondition, ROOT_PATH,
};
use taco_rs::taco::context::resolve_condition;
use taco_rs::taco::{
    check_chain_consistency, CodecConfig, ConditionContext, ConditionExpression, ConditionFactory,
    ConditionLoader, Evaluator,
};

const ADDRESS: &str = "0x1e988ba4692e52Bc50b375bcC8585b95c48AaD77";
const TOKEN_CONTRACT: &str = "0xaDD9D957170dF6F33982001E4c22eCCdd5539118";
const PUBLIC_KEY: &str =
    "-----BEGIN PUBLIC KEY-----\nMFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAE\n-----END PUBLIC KEY-----";

// ============================================================================
// Fixtures
// ============================================================================

/// One canonical wire document per kind
static LEAVES: Lazy<Vec<Value>> = Lazy::new(|| {
    vec![
        json!({
            "conditionType": "rpc",
            "chain": 1,
            "method": "eth_getBalance",
            "parameters": [":userAddress", "latest"],
            "returnValueTest": {"comparator": ">=", "value": "1000000000000000000"}
        }),
        json!({
            "conditionType": "time",
            "chain": 1,
            "method": "blocktime",
            "returnValueTest": {"comparator": ">", "value": 1700000000}
        }),
        json!({
            "conditionType": "contract",
            "chain": 1,
            "method": "balanceOf",
            "parameters": [":userAddress"],
            "returnValueTest": {"comparator": ">", "value": 0},
            "contractAddress": TOKEN_CONTRACT,
            "standardContractType": "ERC721"
        }),
        json!({
            "conditionType": "contract",
            "chain": 1,
            "method": "getMembership",
            "parameters": [":userAddress"],
            "returnValueTest": {"index": 1, "comparator": "==", "value": true},
            "contractAddress": TOKEN_CONTRACT,
            "functionAbi": {
                "type": "function",
                "name": "getMembership",
                "inputs": [{"name": "who", "type": "address", "internalType": "address"}],
                "outputs": [{"name": "tier", "type": "uint8"}, {"name": "active", "type": "bool"}],
                "stateMutability": "view"
            }
        }),
        json!({
            "conditionType": "json-api",
            "endpoint": "https://api.example.com/price",
            "parameters": {"ids": "ethereum", "vs_currencies": "usd"},
            "query": "$.ethereum.usd",
            "authorizationToken": ":authToken",
            "returnValueTest": {"comparator": ">", "value": 1000}
        }),
        json!({
            "conditionType": "json-rpc",
            "endpoint": "https://rpc.example.com",
            "method": "getBalance",
            "params": [":solanaAddress"],
            "query": "$.value",
            "returnValueTest": {"comparator": ">=", "value": 1000000}
        }),
        json!({
            "conditionType": "jwt",
            "jwtToken": ":jwtToken",
            "publicKey": PUBLIC_KEY,
            "expectedIssuer": "auth.example.com"
        }),
    ]
});

fn nested_tree() -> Value {
    json!({
        "conditionType": "if-then-else",
        "ifCondition": {
            "conditionType": "compound",
            "operator": "or",
            "operands": [LEAVES[0], LEAVES[2]]
        },
        "thenCondition": {
            "conditionType": "sequential",
            "failurePolicy": "halt",
            "conditionVariables": [
                {"varName": "price", "condition": LEAVES[4]},
                {"varName": "member", "condition": LEAVES[3]},
                {"varName": "fresh", "condition": {
                    "conditionType": "compound",
                    "operator": "not",
                    "operands": [LEAVES[1]]
                }}
            ]
        },
        "elseCondition": {
            "conditionType": "compound",
            "operator": "and",
            "operands": [LEAVES[5], LEAVES[6]]
        }
    })
}

fn blocktime(chain: u64, comparator: Comparator, value: Value) -> Condition {
    TimeCondition::blocktime(chain, ReturnValueTest::new(comparator, value))
        .unwrap()
        .into()
}

// ============================================================================
// Mock Components
// ============================================================================

/// Executor answering time conditions by chain id and recording every call
struct SpyExecutor {
    block_times: Vec<(u64, i64)>,
    calls: Arc<Mutex<Vec<u64>>>,
}

impl SpyExecutor {
    fn new(block_times: Vec<(u64, i64)>) -> (Arc<Self>, Arc<Mutex<Vec<u64>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Arc::new(Self {
                block_times,
                calls: calls.clone(),
            }),
            calls,
        )
    }
}

#[async_trait]
impl LeafExecutor for SpyExecutor {
    async fn execute(&self, leaf: &Condition) -> Result<Value, Box<dyn Error + Send + Sync>> {
        let chain = leaf.chain().ok_or("only chain conditions are scripted")?;
        self.calls.lock().unwrap().push(chain);
        self.block_times
            .iter()
            .find(|(c, _)| *c == chain)
            .map(|(_, t)| json!(t))
            .ok_or_else(|| format!("chain {} unavailable", chain).into())
    }
}

struct MockProvider {
    chain_id: u64,
}

#[async_trait]
impl ChainProvider for MockProvider {
    async fn get_chain_id(&self) -> Result<u64, Box<dyn Error + Send + Sync>> {
        Ok(self.chain_id)
    }

    async fn call(&self, _request: &CallRequest) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        Ok(vec![0u8; 32])
    }

    async fn get_balance(
        &self,
        _address: &str,
        _block_tag: Option<&str>,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok("0".to_string())
    }
}

struct MockSigner;

#[async_trait]
impl Signer for MockSigner {
    async fn get_address(&self) -> Result<String, Box<dyn Error + Send + Sync>> {
        Ok(ADDRESS.to_string())
    }

    async fn sign_message(&self, _message: &[u8]) -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
        Ok(vec![1u8; 65])
    }
}

// ============================================================================
// Codec Tests
// ============================================================================

#[test]
fn test_every_kind_round_trips() {
    let factory = ConditionFactory::default();
    for wire in LEAVES.iter() {
        let condition = factory.from_wire(wire).expect("Failed to decode leaf");
        assert_eq!(&factory.to_wire(&condition).unwrap(), wire);
    }
}

#[test]
fn test_nested_tree_round_trips() {
    let factory = ConditionFactory::default();
    let tree = nested_tree();
    let condition = factory.from_wire(&tree).expect("Failed to decode tree");

    assert_eq!(condition.condition_type(), ConditionType::IfThenElse);
    assert_eq!(factory.to_wire(&condition).unwrap(), tree);

    let text = factory.to_json_string(&condition).unwrap();
    assert_eq!(factory.from_json_str(&text).unwrap(), condition);

    let via_serde: Condition = serde_json::from_str(&text).unwrap();
    assert_eq!(via_serde, condition);
}

#[test]
fn test_unknown_tag_deep_in_tree() {
    let mut tree = nested_tree();
    tree["thenCondition"]["conditionVariables"][1]["condition"]["conditionType"] = json!("oracle");

    match ConditionFactory::default().from_wire(&tree).unwrap_err() {
        ConditionError::UnknownConditionType { tag, path } => {
            assert_eq!(tag, "oracle");
            assert_eq!(path, "$.thenCondition.conditionVariables[1].condition");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_issues_are_aggregated_across_the_tree() {
    let mut tree = nested_tree();
    tree["ifCondition"]["operands"][0]["chain"] = json!(0);
    tree["elseCondition"]["operands"][0]["endpoint"] = json!("http://rpc.example.com");
    tree["thenCondition"]["conditionVariables"][2]["condition"]["operands"] =
        json!([LEAVES[1], LEAVES[1]]);

    let err = ConditionFactory::default().from_wire(&tree).unwrap_err();
    let report = err.report().expect("expected a validation report");
    assert_eq!(report.len(), 3);
    assert!(report.has_path("$.ifCondition.operands[0].chain"));
    assert!(report.has_path("$.elseCondition.operands[0].endpoint"));
    assert!(report.has_path("$.thenCondition.conditionVariables[2].condition.operands"));
}

#[test]
fn test_non_https_endpoint_rejected_at_construction() {
    let mut api = LEAVES[4].clone();
    api["endpoint"] = json!("http://api.example.com/price");
    let err = ConditionFactory::default().from_wire(&api).unwrap_err();
    assert!(err.to_string().contains("must use https"));
}

#[test]
fn test_compound_arity() {
    let single_and = json!({
        "conditionType": "compound",
        "operator": "and",
        "operands": [LEAVES[1]]
    });
    let double_not = json!({
        "conditionType": "compound",
        "operator": "not",
        "operands": [LEAVES[1], LEAVES[1]]
    });
    for raw in [single_and, double_not] {
        let err = ConditionFactory::default().from_wire(&raw).unwrap_err();
        assert!(err.report().unwrap().issues()[0].is_structural());
    }
}

#[test]
fn test_sequential_rules() {
    let forward = json!({
        "conditionType": "sequential",
        "failurePolicy": "halt",
        "conditionVariables": [
            {"varName": "a", "condition": {
                "conditionType": "time", "chain": 1, "method": "blocktime",
                "returnValueTest": {"comparator": ">", "value": ":b"}
            }},
            {"varName": "b", "condition": LEAVES[1]}
        ]
    });
    let err = ConditionFactory::default().from_wire(&forward).unwrap_err();
    assert!(err.to_string().contains("before it is bound"));

    let duplicate = json!({
        "conditionType": "sequential",
        "conditionVariables": [
            {"varName": "a", "condition": LEAVES[1]},
            {"varName": "a", "condition": LEAVES[1]}
        ]
    });
    let err = ConditionFactory::default().from_wire(&duplicate).unwrap_err();
    assert!(err.to_string().contains("duplicate varName"));
}

#[test]
fn test_depth_limit_from_config() {
    let mut raw = LEAVES[1].clone();
    for _ in 0..10 {
        raw = json!({"conditionType": "compound", "operator": "not", "operands": [raw]});
    }
    let factory = ConditionFactory::new(CodecConfig {
        max_depth: 8,
        ..CodecConfig::default()
    });
    assert!(factory.from_wire(&raw).is_err());
    assert!(ConditionFactory::default().from_wire(&raw).is_ok());
}

// ============================================================================
// Context Tests
// ============================================================================

#[tokio::test]
async fn test_context_binding_and_resolution() {
    let expr = ConditionExpression::new(Condition::from_wire(&LEAVES[2]).unwrap());
    let mut context = expr.build_context();
    assert_eq!(context.missing_parameters().len(), 1);

    context.bind_user_address(&MockSigner).await.unwrap();
    assert!(context.missing_parameters().is_empty());

    let resolved = resolve_condition(expr.condition(), &context.scope(), ROOT_PATH).unwrap();
    assert_eq!(resolved.to_wire().unwrap()["parameters"], json!([ADDRESS]));
}

#[test]
fn test_resolution_names_missing_token() {
    let condition = Condition::from_wire(&LEAVES[4]).unwrap();
    let context = ConditionContext::empty();
    match resolve_condition(&condition, &context.scope(), ROOT_PATH).unwrap_err() {
        ConditionError::UnresolvedParameter { token, path } => {
            assert_eq!(token, ":authToken");
            assert_eq!(path, "$.authorizationToken");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_requested_parameters_of_nested_tree() {
    let condition = Condition::from_wire(&nested_tree()).unwrap();
    let params: Vec<String> = condition
        .requested_parameters()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(
        params,
        vec![":authToken", ":jwtToken", ":solanaAddress", ":userAddress"]
    );
}

#[tokio::test]
async fn test_chain_consistency() {
    let condition = Condition::from_wire(&nested_tree()).unwrap();
    assert!(check_chain_consistency(&condition, &MockProvider { chain_id: 1 })
        .await
        .is_ok());

    let err = check_chain_consistency(&condition, &MockProvider { chain_id: 137 })
        .await
        .unwrap_err();
    assert!(matches!(err, ConditionError::ChainMismatch { expected: 1, found: 137, .. }));
}

// ============================================================================
// Evaluation Tests
// ============================================================================

#[tokio::test]
async fn test_short_circuit_skips_remaining_operands() {
    let (executor, calls) = SpyExecutor::new(vec![(1, 10), (2, 10), (3, 10)]);
    let evaluator = Evaluator::new(executor);

    let and: Condition = CompoundCondition::and(vec![
        blocktime(1, Comparator::Gt, json!(100)),
        blocktime(2, Comparator::Gt, json!(0)),
        blocktime(3, Comparator::Gt, json!(0)),
    ])
    .unwrap()
    .into();
    let outcome = evaluator.evaluate(&and, &ConditionContext::empty()).await.unwrap();
    assert!(!outcome.passed);
    assert_eq!(*calls.lock().unwrap(), vec![1]);
}

#[tokio::test]
async fn test_if_then_else_evaluates_exactly_one_branch() {
    let (executor, calls) = SpyExecutor::new(vec![(1, 10), (2, 10), (3, 10)]);
    let evaluator = Evaluator::new(executor);

    let ite: Condition = IfThenElseCondition::branches(
        blocktime(1, Comparator::Lt, json!(100)),
        blocktime(2, Comparator::Gt, json!(0)),
        blocktime(3, Comparator::Gt, json!(0)),
    )
    .unwrap()
    .into();
    assert!(evaluator.evaluate(&ite, &ConditionContext::empty()).await.unwrap().passed);
    assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn test_sequential_runs_in_order_with_bindings() {
    let (executor, calls) = SpyExecutor::new(vec![(5, 1000), (6, 2000), (7, 3000)]);
    let evaluator = Evaluator::new(executor);

    let sequential: Condition = SequentialCondition::halting(vec![
        ConditionVariable::new("start", blocktime(5, Comparator::Gt, json!(":genesis"))),
        ConditionVariable::new("middle", blocktime(6, Comparator::Gt, json!(":start"))),
        ConditionVariable::new("end", blocktime(7, Comparator::Gt, json!(":middle"))),
    ])
    .unwrap()
    .into();

    let mut context = ConditionContext::for_condition(&sequential);
    context.add_custom_parameter(":genesis", json!(0)).unwrap();
    assert!(context.missing_parameters().is_empty());

    let outcome = evaluator.evaluate(&sequential, &context).await.unwrap();
    assert!(outcome.passed);
    assert_eq!(outcome.value, json!(3000));
    assert_eq!(*calls.lock().unwrap(), vec![5, 6, 7]);
}

#[tokio::test]
async fn test_nested_sequential_reads_enclosing_binding() {
    let (executor, calls) = SpyExecutor::new(vec![(5, 1000), (6, 2000), (7, 3000)]);
    let evaluator = Evaluator::new(executor);

    let time = |chain: u64, value: Value| {
        json!({
            "conditionType": "time",
            "chain": chain,
            "method": "blocktime",
            "returnValueTest": {"comparator": ">", "value": value}
        })
    };
    let tree = ConditionFactory::default()
        .from_wire(&json!({
            "conditionType": "sequential",
            "conditionVariables": [
                {"varName": "x", "condition": time(5, json!(0))},
                {"varName": "y", "condition": {
                    "conditionType": "sequential",
                    "conditionVariables": [
                        {"varName": "a", "condition": time(6, json!(":x"))},
                        {"varName": "x", "condition": time(7, json!(":a"))}
                    ]
                }}
            ]
        }))
        .expect("enclosing binding should be visible");

    let outcome = evaluator.evaluate(&tree, &ConditionContext::empty()).await.unwrap();
    assert!(outcome.passed);
    assert_eq!(*calls.lock().unwrap(), vec![5, 6, 7]);
}

#[tokio::test]
async fn test_executor_failure_surfaces_path() {
    let (executor, _) = SpyExecutor::new(vec![]);
    let evaluator = Evaluator::new(executor);
    let tree: Condition = CompoundCondition::not(blocktime(9, Comparator::Gt, json!(0)))
        .unwrap()
        .into();

    match evaluator.evaluate(&tree, &ConditionContext::empty()).await.unwrap_err() {
        ConditionError::Execution { condition_type, path, message } => {
            assert_eq!(condition_type, "time");
            assert_eq!(path, "$.operands[0]");
            assert!(message.contains("chain 9 unavailable"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Loading Tests
// ============================================================================

#[test]
fn test_load_documents_from_disk() {
    let dir = std::env::temp_dir().join(format!("taco-rs-loader-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let json_path = dir.join("expression.json");
    let expr = ConditionExpression::new(Condition::from_wire(&nested_tree()).unwrap());
    std::fs::write(&json_path, expr.to_json_string().unwrap()).unwrap();

    let yaml_path = dir.join("condition.yaml");
    std::fs::write(&yaml_path, serde_yaml::to_string(&LEAVES[1]).unwrap()).unwrap();

    let loader = ConditionLoader::default();
    assert_eq!(loader.load(&json_path).unwrap(), expr);
    assert_eq!(
        loader.load(&yaml_path).unwrap().condition().condition_type(),
        ConditionType::Time
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_expression_version_gate() {
    let expr = ConditionExpression::new(Condition::from_wire(&LEAVES[1]).unwrap());
    let mut json = expr.to_json().unwrap();
    json["version"] = json!("3.1.0");
    assert!(matches!(
        ConditionExpression::from_json(&json),
        Err(ConditionError::IncompatibleVersion { .. })
    ));
}
