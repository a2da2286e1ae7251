//! `CBst`: a non-self-balancing binary search tree keyed on [`CStr`].
//!
//! Ordering follows the convention resolved in `SPEC_FULL.md` §9 (the
//! latest of the original's two disagreeing revisions): during descent, a
//! *negative* comparison (`key < node.key`) sends the search **right**,
//! and a positive one sends it left. This is backwards from the usual
//! left-is-less convention — keep it that way; a reimplementer who
//! "fixes" it will silently invert every tree this module touches.
//!
//! Nodes are intrusive (raw `l`/`r` pointers, like [`crate::list`]):
//! a `BstNode` doesn't own its children, it just links nodes that already
//! exist somewhere else (typically arena-allocated).

use crate::cstr::CStr;
use crate::slc::{self, Slc};
use core::cmp::Ordering;
use core::ptr;

pub struct BstNode<'a> {
    pub l: *mut BstNode<'a>,
    pub r: *mut BstNode<'a>,
    pub key: CStr<'a>,
}

impl<'a> BstNode<'a> {
    pub fn new(key: CStr<'a>) -> Self {
        BstNode { l: ptr::null_mut(), r: ptr::null_mut(), key }
    }
}

/// Descend from `*node`, updating `*node` to the closest ancestor visited.
/// Returns `0` on an exact match, `sign(key - node.key)` on a miss (and
/// `*node` is left at the last node visited before falling off the tree,
/// or unchanged if the tree was empty).
///
/// # Safety
/// Every `l`/`r` pointer reachable from `*node` must be valid or null.
pub unsafe fn find(node: &mut *mut BstNode<'_>, key: Slc) -> i32 {
    if node.is_null() {
        return 0;
    }
    loop {
        let cmp = slc::cmp(key, unsafe { (**node).key.as_slc() });
        if cmp == 0 {
            return 0;
        }
        if cmp < 0 {
            let r = unsafe { (**node).r };
            if r.is_null() {
                return cmp;
            }
            *node = r;
        } else {
            let l = unsafe { (**node).l };
            if l.is_null() {
                return cmp;
            }
            *node = l;
        }
    }
}

/// Return the node matching `key`, or `null` if absent.
///
/// # Safety
/// Same as [`find`].
pub unsafe fn get(root: *mut BstNode<'_>, key: Slc) -> *mut BstNode<'_> {
    let mut node = root;
    if unsafe { find(&mut node, key) } == 0 {
        node
    } else {
        ptr::null_mut()
    }
}

/// Insert `add` under the appropriate child if its key is absent,
/// updating `*root` if the tree was empty. `add`'s own `l`/`r` are reset
/// to null on first link; its key and any existing children are
/// otherwise left untouched. Returns the colliding node if `add.key`
/// already exists (in which case `add` is not linked in).
///
/// # Safety
/// `add` must be valid and not already part of any tree; every node
/// reachable through `*root` must be valid or null.
pub unsafe fn add<'a>(root: &mut *mut BstNode<'a>, add: *mut BstNode<'a>) -> *mut BstNode<'a> {
    if root.is_null() {
        *root = add;
        return ptr::null_mut();
    }
    let mut node = *root;
    let key = unsafe { (*add).key.as_slc() };
    let cmp = unsafe { find(&mut node, key) };
    if cmp == 0 {
        return node;
    }
    unsafe {
        if cmp < 0 {
            (*node).r = add;
        } else {
            (*node).l = add;
        }
        (*add).l = ptr::null_mut();
        (*add).r = ptr::null_mut();
    }
    ptr::null_mut()
}

/// Sign of `slc::cmp`, spelled out for readability at call sites that
/// only care about direction, not the raw comparison result.
pub fn sign(cmp: i32) -> Ordering {
    cmp.cmp(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf<'a>(s: &'a [u8]) -> BstNode<'a> {
        BstNode::new(CStr::from_prefixed(s))
    }

    #[test]
    fn descent_direction_and_lookup_match_spec() {
        // length-prefixed literals: [len, ...bytes]
        let abbd = [4u8, b'a', b'b', b'b', b'd'];
        let aaa = [3u8, b'a', b'a', b'a'];
        let abc = [3u8, b'a', b'b', b'c'];

        let mut n_abbd = leaf(&abbd);
        let mut n_aaa = leaf(&aaa);
        let mut n_abc = leaf(&abc);

        let mut root: *mut BstNode<'_> = ptr::null_mut();
        unsafe {
            assert!(add(&mut root, &mut n_abbd).is_null());
            assert!(add(&mut root, &mut n_aaa).is_null());
            assert!(add(&mut root, &mut n_abc).is_null());

            // "aaa" < "abbd" (cmp<0) descends right; "abc" > "abbd" (cmp>0)
            // descends left — one child per direction off the root.
            assert_eq!(root, &mut n_abbd as *mut _);
            crate::assert_eq_test!((*root).r, &mut n_aaa as *mut _, "cmp<0 must descend right");
            crate::assert_eq_test!((*root).l, &mut n_abc as *mut _, "cmp>0 must descend left");

            let mut cursor = root;
            assert_eq!(find(&mut cursor, Slc::from("abbd")), 0);
            assert_eq!(cursor, &mut n_abbd as *mut _);

            let mut cursor = root;
            assert_eq!(find(&mut cursor, Slc::from("aaa")), 0);
            assert_eq!(cursor, &mut n_aaa as *mut _);

            let mut cursor = root;
            assert_eq!(find(&mut cursor, Slc::from("abc")), 0);
            assert_eq!(cursor, &mut n_abc as *mut _);
        }
    }

    #[test]
    fn add_returns_colliding_node_without_relinking() {
        let abbd = [4u8, b'a', b'b', b'b', b'd'];
        let abbd2 = [4u8, b'a', b'b', b'b', b'd'];
        let mut n1 = leaf(&abbd);
        let mut n2 = leaf(&abbd2);
        let mut root: *mut BstNode<'_> = ptr::null_mut();
        unsafe {
            assert!(add(&mut root, &mut n1).is_null());
            let collide = add(&mut root, &mut n2);
            assert_eq!(collide, &mut n1 as *mut _);
            assert!((*root).l.is_null());
            assert!((*root).r.is_null());
        }
    }

    #[test]
    fn get_returns_null_for_missing_key() {
        let abbd = [4u8, b'a', b'b', b'b', b'd'];
        let mut n1 = leaf(&abbd);
        let mut root: *mut BstNode<'_> = &mut n1;
        unsafe {
            assert!(get(root, Slc::from("zzz")).is_null());
            assert_eq!(get(root, Slc::from("abbd")), root);
        }
        let _ = &mut root;
    }
}
