//! C ABI entry point.
//!
//! Every caller array is pinned through an [`ArraySource`] and held by a
//! [`Pinned`] guard that releases it when dropped, so an early return on any
//! error path still releases everything acquired so far. Errors and panics
//! are caught here and handed back as a message; nothing else crosses.

use crate::bridge::{BridgeError, compute_layout};
use crate::core::defs::{EdgeSpec, GraphDescription, LayoutParams, NodeSize};
use std::any::Any;
use std::ffi::{CString, c_char};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

/// A caller-owned array that must be acquired before reading and released
/// exactly once afterwards
pub trait ArraySource<T> {
    /// `None` when the elements cannot be obtained
    fn acquire(&self) -> Option<&[T]>;
    fn release(&self);
}

/// Scoped hold on an acquired array
pub struct Pinned<'a, T> {
    source: &'a dyn ArraySource<T>,
    data: &'a [T],
}

impl<'a, T> Pinned<'a, T> {
    pub fn acquire(source: &'a dyn ArraySource<T>, name: &str) -> Result<Self, BridgeError> {
        let data = source
            .acquire()
            .ok_or_else(|| BridgeError::InputAcquisition(name.to_string()))?;
        Ok(Self { source, data })
    }

    /// First `len` elements, failing if the array is shorter
    pub fn prefix(&self, len: usize, name: &str) -> Result<&'a [T], BridgeError> {
        self.data.get(..len).ok_or_else(|| {
            BridgeError::InputAcquisition(format!(
                "{name} holds {} elements, expected {len}",
                self.data.len()
            ))
        })
    }
}

impl<T> Drop for Pinned<'_, T> {
    fn drop(&mut self) {
        self.source.release();
    }
}

/// Array passed as pointer plus length over the C ABI
pub struct RawArray<T> {
    ptr: *const T,
    len: usize,
}

impl<T> RawArray<T> {
    /// # Safety
    /// A non-null `ptr` must be valid for reads of `len` elements for the
    /// lifetime of the returned value.
    pub unsafe fn new(ptr: *const T, len: usize) -> Self {
        Self { ptr, len }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }
}

impl<T> ArraySource<T> for RawArray<T> {
    fn acquire(&self) -> Option<&[T]> {
        if self.len == 0 {
            return Some(&[]);
        }
        if self.ptr.is_null() {
            return None;
        }
        // SAFETY: upheld by the contract of `RawArray::new`
        Some(unsafe { std::slice::from_raw_parts(self.ptr, self.len) })
    }

    fn release(&self) {}
}

/// Arrays and scalars of one layout call as they arrive over the boundary
pub struct BorrowedInput<'a> {
    pub node_indices: &'a dyn ArraySource<i32>,
    pub edge_sources: &'a dyn ArraySource<i32>,
    pub edge_targets: &'a dyn ArraySource<i32>,
    pub edge_weights: &'a dyn ArraySource<f32>,
    /// Both present or both absent
    pub node_sizes: Option<(&'a dyn ArraySource<f32>, &'a dyn ArraySource<f32>)>,
    pub num_nodes: i32,
    pub num_edges: i32,
    pub quality: i32,
    pub linear_layout: bool,
    pub aspect_ratio: f64,
    pub component_separation: f64,
}

/// Pin every array, copy the graph out, release, then lay out.
/// Returns the flat coordinate sequence.
pub fn layout_borrowed(input: &BorrowedInput<'_>) -> Result<Vec<f32>, BridgeError> {
    let num_nodes = usize::try_from(input.num_nodes).map_err(|_| {
        BridgeError::InputAcquisition(format!("negative node count {}", input.num_nodes))
    })?;
    let num_edges = usize::try_from(input.num_edges).map_err(|_| {
        BridgeError::InputAcquisition(format!("negative edge count {}", input.num_edges))
    })?;

    let description = {
        let nodes = Pinned::acquire(input.node_indices, "node indices")?;
        let sources = Pinned::acquire(input.edge_sources, "edge sources")?;
        let targets = Pinned::acquire(input.edge_targets, "edge targets")?;
        let weights = Pinned::acquire(input.edge_weights, "edge weights")?;
        let sizes = match input.node_sizes {
            Some((widths, heights)) => Some((
                Pinned::acquire(widths, "node widths")?,
                Pinned::acquire(heights, "node heights")?,
            )),
            None => None,
        };

        nodes.prefix(num_nodes, "node indices")?;
        let sources = sources.prefix(num_edges, "edge sources")?;
        let targets = targets.prefix(num_edges, "edge targets")?;
        let weights = weights.prefix(num_edges, "edge weights")?;

        let edges = sources
            .iter()
            .zip(targets)
            .zip(weights)
            .map(|((&s, &t), &w)| EdgeSpec::new(s, t, w))
            .collect();
        let node_sizes = match &sizes {
            Some((widths, heights)) => Some(
                widths
                    .prefix(num_nodes, "node widths")?
                    .iter()
                    .zip(heights.prefix(num_nodes, "node heights")?)
                    .map(|(&w, &h)| NodeSize::new(w, h))
                    .collect(),
            ),
            None => None,
        };

        GraphDescription {
            node_count: num_nodes,
            edges,
            node_sizes,
        }
    };

    let params = LayoutParams {
        quality_level: input.quality,
        preserve_initial_positions: input.linear_layout,
        aspect_ratio: input.aspect_ratio,
        component_separation: input.component_separation,
        seed: None,
    };
    compute_layout(&description, &params).map(|result| result.coordinates)
}

/// Outcome of [`fmmm_layout_graph`]. Exactly one of `positions` and
/// `error` is non-null. Free with [`fmmm_result_free`].
#[repr(C)]
#[derive(Debug)]
pub struct FmmmResult {
    pub positions: *mut f32,
    pub len: usize,
    pub error: *mut c_char,
}

impl FmmmResult {
    fn success(coordinates: Vec<f32>) -> Self {
        let boxed = coordinates.into_boxed_slice();
        let len = boxed.len();
        Self {
            positions: Box::into_raw(boxed).cast::<f32>(),
            len,
            error: ptr::null_mut(),
        }
    }

    fn failure(message: &str) -> Self {
        let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
        Self {
            positions: ptr::null_mut(),
            len: 0,
            error: message.into_raw(),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "layout panicked".to_string()
    }
}

/// Lay out a graph given as parallel arrays.
///
/// `node_widths` and `node_heights` may both be null to use the default
/// node size. Edges with out-of-range endpoints are skipped.
///
/// # Safety
/// Every non-null pointer must be valid for reads of the number of elements
/// implied by `num_nodes` (node arrays) or `num_edges` (edge arrays) for the
/// duration of the call.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn fmmm_layout_graph(
    node_indices: *const i32,
    edge_sources: *const i32,
    edge_targets: *const i32,
    edge_weights: *const f32,
    node_widths: *const f32,
    node_heights: *const f32,
    num_nodes: i32,
    num_edges: i32,
    quality: i32,
    linear_layout: bool,
    aspect_ratio: f64,
    component_separation: f64,
) -> FmmmResult {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let node_len = usize::try_from(num_nodes).unwrap_or(0);
        let edge_len = usize::try_from(num_edges).unwrap_or(0);

        // SAFETY: the caller guarantees the pointers cover these lengths
        let (nodes, sources, targets, weights, widths, heights) = unsafe {
            (
                RawArray::new(node_indices, node_len),
                RawArray::new(edge_sources, edge_len),
                RawArray::new(edge_targets, edge_len),
                RawArray::new(edge_weights, edge_len),
                RawArray::new(node_widths, node_len),
                RawArray::new(node_heights, node_len),
            )
        };

        let node_sizes: Option<(&dyn ArraySource<f32>, &dyn ArraySource<f32>)> =
            match (widths.is_null(), heights.is_null()) {
                (true, true) => None,
                (false, false) => Some((&widths, &heights)),
                _ => {
                    return Err(BridgeError::InputAcquisition(
                        "node widths and heights must both be given or both be null".to_string(),
                    ));
                }
            };

        layout_borrowed(&BorrowedInput {
            node_indices: &nodes,
            edge_sources: &sources,
            edge_targets: &targets,
            edge_weights: &weights,
            node_sizes,
            num_nodes,
            num_edges,
            quality,
            linear_layout,
            aspect_ratio,
            component_separation,
        })
    }));

    match outcome {
        Ok(Ok(coordinates)) => FmmmResult::success(coordinates),
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "layout call failed");
            FmmmResult::failure(&err.to_string())
        }
        Err(payload) => FmmmResult::failure(&panic_message(payload)),
    }
}

/// Release a result returned by [`fmmm_layout_graph`]. Null is ignored;
/// the result is reset so a second call is a no-op.
///
/// # Safety
/// `result` must be null or point to a value produced by
/// [`fmmm_layout_graph`] that has not been modified.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fmmm_result_free(result: *mut FmmmResult) {
    // SAFETY: the caller passes null or a valid result
    let Some(result) = (unsafe { result.as_mut() }) else {
        return;
    };
    if !result.positions.is_null() {
        // SAFETY: produced by `Box::into_raw` on a boxed slice of `len` floats
        drop(unsafe {
            Box::from_raw(ptr::slice_from_raw_parts_mut(result.positions, result.len))
        });
    }
    if !result.error.is_null() {
        // SAFETY: produced by `CString::into_raw`
        drop(unsafe { CString::from_raw(result.error) });
    }
    *result = FmmmResult {
        positions: ptr::null_mut(),
        len: 0,
        error: ptr::null_mut(),
    };
}
