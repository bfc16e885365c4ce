use super::*;
use crate::{KvStorage, MemoryKv, verify_proof};

fn five_leaf_tree() -> MerkleTree<MemoryStorage> {
    let tree = memory_tree("t");
    for value in [A, B, C, D, E] {
        tree.append_leaf(value).expect("append");
    }
    tree
}

#[test]
fn proof_for_carried_leaf_has_one_step() {
    let tree = five_leaf_tree();
    let [ha, hb, hc, hd, _] = [A, B, C, D, E].map(digest_of);
    let abcd = branch_hash(&branch_hash(&ha, &hb), &branch_hash(&hc, &hd));

    let proof = tree.generate_proof(E).expect("proof");
    assert_eq!(proof, vec![abcd]);
    assert!(tree.verify(&proof, E).expect("verify"));
    for other in [A, B, C, D] {
        assert!(!tree.verify(&proof, other).expect("verify"), "{other}");
    }
}

#[test]
fn proof_collects_siblings_bottom_up() {
    let tree = five_leaf_tree();
    let [ha, hb, hc, hd, he] = [A, B, C, D, E].map(digest_of);
    let ab = branch_hash(&ha, &hb);
    let cd = branch_hash(&hc, &hd);

    assert_eq!(tree.generate_proof(A).expect("proof"), vec![hb, cd, he]);
    assert_eq!(tree.generate_proof(C).expect("proof"), vec![hd, ab, he]);
    assert_eq!(tree.generate_proof(D).expect("proof"), vec![hc, ab, he]);
}

#[test]
fn left_and_right_siblings_both_verify() {
    let tree = five_leaf_tree();
    // A only has siblings to its right; B starts with one to its left.
    for value in [A, B, C, D, E] {
        let proof = tree.generate_proof(value).expect("proof");
        assert!(tree.verify(&proof, value).expect("verify"), "{value}");
    }
}

#[test]
fn every_leaf_verifies_at_every_size() {
    let tree = memory_tree("t");
    for n in 0..17 {
        tree.append_leaf(&address(n)).expect("append");
        for i in 0..=n {
            let value = address(i);
            let proof = tree.generate_proof(&value).expect("proof");
            assert!(
                tree.verify(&proof, &value).expect("verify"),
                "leaf {i} of {}",
                n + 1
            );
        }
    }
}

#[test]
fn single_leaf_tree_has_empty_proof() {
    let tree = memory_tree("t");
    tree.append_leaf(A).expect("append");

    let proof = tree.generate_proof(A).expect("proof");
    assert!(proof.is_empty());
    assert!(tree.verify(&proof, A).expect("verify"));
    assert!(!tree.verify(&proof, B).expect("verify"));
}

#[test]
fn absent_values_get_empty_proofs() {
    let tree = five_leaf_tree();
    let absent = address(99);
    let proof = tree.generate_proof(&absent).expect("proof");
    assert!(proof.is_empty());
    assert!(!tree.verify(&proof, &absent).expect("verify"));
    assert!(tree.generate_proof("not an address").expect("proof").is_empty());
}

#[test]
fn empty_tree_verifies_nothing() {
    let tree = memory_tree("t");
    assert!(tree.generate_proof(A).expect("proof").is_empty());
    assert!(!tree.verify(&[], A).expect("verify"));
}

#[test]
fn malformed_values_verify_false() {
    let tree = five_leaf_tree();
    let proof = tree.generate_proof(A).expect("proof");
    assert!(!tree.verify(&proof, "0xzz").expect("verify"));
    assert!(!tree.verify(&proof, "").expect("verify"));
}

#[test]
fn proofs_go_stale_when_the_tree_grows() {
    let tree = memory_tree("t");
    for value in [A, B, C, D] {
        tree.append_leaf(value).expect("append");
    }
    let old_root = tree.root_digest().expect("root").expect("non-empty");
    let stale = tree.generate_proof(A).expect("proof");

    tree.append_leaf(E).expect("append");
    assert!(!tree.verify(&stale, A).expect("verify"));
    assert!(verify_proof(&stale, A, &old_root));

    let fresh = tree.generate_proof(A).expect("proof");
    assert!(tree.verify(&fresh, A).expect("verify"));
}

#[test]
fn offline_verification_against_published_root() {
    let tree = five_leaf_tree();
    let root = tree.root_digest().expect("root").expect("non-empty");
    let proof = tree.generate_proof(C).expect("proof");
    assert!(verify_proof(&proof, C, &root));
    assert!(!verify_proof(&proof, D, &root));
    assert!(!verify_proof(&proof[1..], C, &root));
}

#[test]
fn keyed_backend_proofs_match_memory() {
    let memory = five_leaf_tree();
    let keyed = TreeManager::new(KvStorage::new(MemoryKv::new()))
        .create_tree("t")
        .expect("valid tree id");
    for value in [A, B, C, D, E] {
        keyed.append_leaf(value).expect("append");
    }
    for value in [A, B, C, D, E] {
        let proof = keyed.generate_proof(value).expect("proof");
        assert_eq!(proof, memory.generate_proof(value).expect("proof"));
        assert!(keyed.verify(&proof, value).expect("verify"));
    }
}
