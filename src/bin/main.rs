use avl_arena::AvlTree;

fn main() {
    let mut tree: AvlTree<u32, ()> = AvlTree::new();

    for key in [2, 0, 3, 4, 5, 1, 6] {
        tree.insert(key, ());
        tree.assert_invariants();
        println!("{:?}", tree.keys().collect::<Vec<_>>());
    }

    let (zero, ()) = tree.pop_first().unwrap();
    assert_eq!(zero, 0);
    tree.assert_invariants();

    tree.remove(&4);
    tree.assert_invariants();
    println!("{:?}", tree.keys().collect::<Vec<_>>());

    let mut graph = String::new();
    tree.dotgraph("demo", &mut graph).unwrap();
    println!("{graph}");
}
